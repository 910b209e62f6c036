//! apate-replay
//!
//! Replays a recorded AIS trace against a running transmitter, keeping the
//! recorded timing between sentences.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod exit;
mod telemetry;

use apate_core::{DEFAULT_ENDPOINT, DEFAULT_TRANSMIT_COUNT, GroupPolicy, ReplayConfig};
use apate_replay::{ReplayReport, ReplaySession, SessionError, load_plan};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;

#[derive(Debug, Parser)]
#[command(name = "apate-replay", version)]
#[command(about = "Replay a recorded AIS trace against a transmitter", long_about = None)]
struct Cli {
    /// Trace file, one `<seconds>-<sentence>` per line
    trace: PathBuf,

    /// Transmitter WebSocket URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Times each message is sent
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_TRANSMIT_COUNT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    transmit_count: u32,

    /// Fail instead of skipping fragment groups that never complete
    #[arg(long)]
    abort_on_incomplete: bool,

    /// Drop sentences whose checksum does not match
    #[arg(long)]
    verify_checksum: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> ReplayConfig {
        let policy = if self.abort_on_incomplete {
            GroupPolicy::Abort
        } else {
            GroupPolicy::Skip
        };
        ReplayConfig::default()
            .with_endpoint(self.endpoint.clone())
            .with_transmit_count(self.transmit_count)
            .with_group_policy(policy)
            .with_checksum_verification(self.verify_checksum)
    }
}

fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("failed to install error reporter: {err}");
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too, on stdout
            let code = if err.use_stderr() { exit::USAGE } else { exit::OK };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: {:?}", color_eyre::Report::new(err));
            return ExitCode::from(exit::IOERR);
        }
    };

    let dispatch = telemetry::dispatch(cli.verbose);
    let cancel = CancellationToken::new();
    let outcome = runtime.block_on(async {
        tokio::spawn(interrupt_on_ctrl_c(cancel.clone()).with_subscriber(dispatch.clone()));
        replay(&cli, cancel).with_subscriber(dispatch).await
    });

    match outcome {
        Ok(report) if report.interrupted => ExitCode::from(exit::INTERRUPTED),
        Ok(_) => ExitCode::from(exit::OK),
        Err(err) => {
            let code = exit::code_for(&err);
            eprintln!("Error: {:?}", color_eyre::Report::new(err));
            ExitCode::from(code)
        }
    }
}

async fn interrupt_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::warn!("interrupt received, stopping replay");
            cancel.cancel();
        }
        Err(err) => tracing::error!(error = %err, "cannot listen for interrupts"),
    }
}

async fn replay(cli: &Cli, cancel: CancellationToken) -> Result<ReplayReport, SessionError> {
    let config = cli.config();
    tracing::info!(
        trace = %cli.trace.display(),
        endpoint = %config.endpoint,
        transmit_count = config.transmit_count,
        "starting apate replay"
    );

    let plan = load_plan(&cli.trace, &config)?;
    let mut session = ReplaySession::connect(plan, &config).await?;
    let report = session.run(cancel).await?;

    match serde_json::to_string(&report) {
        Ok(json) => tracing::info!(report = %json, "replay finished"),
        Err(err) => tracing::warn!(error = %err, "could not serialise replay report"),
    }
    Ok(report)
}
