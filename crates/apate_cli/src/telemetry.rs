//! Log subscriber construction.
//!
//! The subscriber is handed back as a [`Dispatch`] for the caller to attach
//! to the futures that should log through it.

use std::io::IsTerminal;
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Filter used when `RUST_LOG` is unset and no `-v` was given
pub const DEFAULT_FILTER: &str = "apate=info";

/// Filter directive for a `-v` count
#[must_use]
pub fn directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_FILTER,
        1 => "apate=debug",
        _ => "apate=trace",
    }
}

/// Build the filter; `-v` takes precedence over `RUST_LOG`
#[must_use]
pub fn filter(verbosity: u8) -> EnvFilter {
    if verbosity == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    } else {
        EnvFilter::new(directive(verbosity))
    }
}

/// Build a stderr subscriber for the given verbosity
#[must_use]
pub fn dispatch(verbosity: u8) -> Dispatch {
    build(verbosity, std::io::stderr().is_terminal(), std::io::stderr)
}

fn build<W>(verbosity: u8, ansi: bool, writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_thread_names(true)
        .with_line_number(true)
        .with_ansi(ansi)
        .with_writer(writer)
        .finish();
    Dispatch::new(subscriber)
}
