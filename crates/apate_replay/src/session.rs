//! Replay sessions.
//!
//! A session owns the plan and the one outbound connection. It runs the
//! scheduler until the plan is exhausted, a transmission fails or the
//! operator interrupts, and always releases the connection afterwards.

use crate::plan::ReplayPlan;
use crate::reassemble::{Reassembler, ReassemblyError};
use crate::scheduler::Scheduler;
use crate::trace::{TraceError, TraceReader};
use crate::transmit::{Dispatcher, TransmitError, Transmitter, WsTransmitter};
use apate_aivdm::AivdmDecoder;
use apate_core::{CoreError, ReplayConfig};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Error that ends a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] CoreError),

    /// The trace could not be loaded
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// A fragment group broke under the abort policy
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),

    /// The outbound connection failed
    #[error(transparent)]
    Transmit(#[from] TransmitError),
}

/// Summary of a finished session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Timestamps fully transmitted
    pub batches: usize,
    /// Messages fully transmitted
    pub messages: usize,
    /// Frames written, repeats included
    pub frames: u64,
    /// Fragment groups skipped while loading
    pub dropped_groups: usize,
    /// True if the operator stopped the replay
    pub interrupted: bool,
    /// Virtual cursor at the end, in seconds
    pub cursor_secs: f64,
}

/// Load and reassemble the trace at `path` according to `config`
///
/// # Errors
///
/// Returns error if the config is invalid, the trace is missing or
/// malformed, or a group breaks under the abort policy
pub fn load_plan(path: impl AsRef<Path>, config: &ReplayConfig) -> Result<ReplayPlan, SessionError> {
    config.validate()?;
    let trace = TraceReader::open(path)?;
    let decoder = AivdmDecoder::new().with_checksum_verification(config.verify_checksum);
    let reassembler = Reassembler::new(decoder).with_policy(config.group_policy);
    let plan = ReplayPlan::build(trace, &reassembler)?;
    tracing::info!(
        timestamps = plan.len(),
        messages = plan.message_count(),
        dropped_groups = plan.dropped_groups(),
        "trace loaded"
    );
    Ok(plan)
}

/// A replay of one plan over one connection
pub struct ReplaySession<T> {
    plan: ReplayPlan,
    dispatcher: Dispatcher<T>,
}

impl ReplaySession<WsTransmitter> {
    /// Open the outbound connection described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid or the endpoint is unreachable
    pub async fn connect(plan: ReplayPlan, config: &ReplayConfig) -> Result<Self, SessionError> {
        let transmit_count = transmit_count(config)?;
        let transmitter = WsTransmitter::connect(&config.endpoint).await?;
        Ok(Self::new(plan, Dispatcher::new(transmitter, transmit_count)))
    }
}

impl<T: Transmitter> ReplaySession<T> {
    /// Create a session over an already-open dispatcher
    #[must_use]
    pub fn new(plan: ReplayPlan, dispatcher: Dispatcher<T>) -> Self {
        Self { plan, dispatcher }
    }

    /// Borrow the dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Replay the plan until it is exhausted or `cancel` fires
    ///
    /// The connection is closed on every path out. After an interrupt the
    /// batch in flight is abandoned, not resumed.
    ///
    /// # Errors
    ///
    /// Returns the transmission failure that ended the session
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<ReplayReport, SessionError> {
        let plan = std::mem::take(&mut self.plan);
        let mut report = ReplayReport {
            dropped_groups: plan.dropped_groups(),
            ..ReplayReport::default()
        };
        let mut scheduler = Scheduler::new();
        tracing::info!(batches = plan.len(), "starting replay");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = scheduler.run(plan.into_batches(), &mut self.dispatcher) => Some(result),
        };

        report.batches = scheduler.batches_emitted();
        report.messages = scheduler.messages_sent();
        report.frames = self.dispatcher.frames_sent();
        report.cursor_secs = scheduler.pacer().cursor().as_secs_f64();

        match outcome {
            Some(Err(err)) => {
                tracing::error!(error = %err, "transmission failed, aborting replay");
                if let Err(close_err) = self.dispatcher.close().await {
                    tracing::debug!(error = %close_err, "connection release failed");
                }
                Err(err.into())
            }
            Some(Ok(())) => {
                tracing::warn!("replay exhausted");
                self.dispatcher.close().await?;
                Ok(report)
            }
            None => {
                tracing::warn!(batches = report.batches, "replay interrupted");
                report.interrupted = true;
                self.dispatcher.close().await?;
                Ok(report)
            }
        }
    }
}

fn transmit_count(config: &ReplayConfig) -> Result<NonZeroU32, CoreError> {
    NonZeroU32::new(config.transmit_count).ok_or_else(|| CoreError::Validation {
        field: "transmit_count".to_string(),
        reason: "must be at least 1".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PART_ONE, PART_TWO, RecordingTransmitter, SINGLE};
    use crate::trace::TraceReader;
    use apate_core::GroupPolicy;
    use std::io::Write;
    use std::time::Duration;

    fn plan_from(text: &str) -> ReplayPlan {
        let trace = TraceReader::parse_str(text).unwrap();
        ReplayPlan::build(trace, &Reassembler::new(AivdmDecoder::new())).unwrap()
    }

    fn session(plan: ReplayPlan, transmitter: RecordingTransmitter) -> ReplaySession<RecordingTransmitter> {
        ReplaySession::new(plan, Dispatcher::new(transmitter, NonZeroU32::new(2).unwrap()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_two_batches() {
        // recorded out of order on purpose
        let plan = plan_from(&format!("2-{}\n2-{}\n0-{}\n", PART_ONE, PART_TWO, SINGLE));
        let mut session = session(plan, RecordingTransmitter::new());
        let report = session.run(CancellationToken::new()).await.unwrap();

        let transmitter = session.dispatcher().transmitter();
        let frames = transmitter.frames();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].len(), 168);
        assert_eq!(frames[0], frames[1]);
        assert_eq!(frames[2].len(), 424);
        assert_eq!(frames[2], frames[3]);

        let sent_at = transmitter.sent_at();
        assert!(sent_at[1] < Duration::from_millis(10));
        assert!(sent_at[2] >= Duration::from_secs(2));
        assert!(sent_at[3] < Duration::from_millis(2010));
        assert!(transmitter.is_closed());

        assert_eq!(
            report,
            ReplayReport {
                batches: 2,
                messages: 2,
                frames: 4,
                dropped_groups: 0,
                interrupted: false,
                cursor_secs: report.cursor_secs,
            }
        );
        assert!(report.cursor_secs >= 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_releases_connection() {
        let plan = plan_from(&format!("0-{}\n60-{}\n", SINGLE, SINGLE));
        let mut session = session(plan, RecordingTransmitter::new());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let report = session.run(cancel).await.unwrap();
        assert!(report.interrupted);
        assert_eq!(report.batches, 1);
        assert_eq!(report.frames, 2);
        assert!(report.cursor_secs < 60.0);
        assert!(session.dispatcher().transmitter().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_failure_is_fatal_and_releases_connection() {
        let plan = plan_from(&format!("0-{}\n1-{}\n", SINGLE, SINGLE));
        let mut session = session(plan, RecordingTransmitter::failing_after(3));

        let err = session.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::Transmit(TransmitError::Closed)));
        assert!(session.dispatcher().transmitter().is_closed());
        assert_eq!(session.dispatcher().frames_sent(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_plan_finishes_immediately() {
        let mut session = session(ReplayPlan::default(), RecordingTransmitter::new());
        let report = session.run(CancellationToken::new()).await.unwrap();
        assert_eq!(report.batches, 0);
        assert!(!report.interrupted);
    }

    #[test]
    fn test_load_plan_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0-{}", SINGLE).unwrap();
        writeln!(file, "1-{}", PART_ONE).unwrap();

        let plan = load_plan(file.path(), &ReplayConfig::default()).unwrap();
        assert_eq!(plan.message_count(), 1);
        assert_eq!(plan.dropped_groups(), 1);

        let strict = ReplayConfig::default().with_group_policy(GroupPolicy::Abort);
        let err = load_plan(file.path(), &strict).unwrap_err();
        assert!(matches!(err, SessionError::Reassembly(_)));
    }

    #[test]
    fn test_load_plan_errors() {
        let err = load_plan("/no/such/trace.txt", &ReplayConfig::default()).unwrap_err();
        assert!(matches!(err, SessionError::Trace(TraceError::NotFound { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0-{}", SINGLE).unwrap();
        writeln!(file, "no separator here").unwrap();
        let err = load_plan(file.path(), &ReplayConfig::default()).unwrap_err();
        assert!(matches!(err, SessionError::Trace(TraceError::Format { line: 2, .. })));

        let bad = ReplayConfig::default().with_transmit_count(0);
        let err = load_plan(file.path(), &bad).unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn test_checksum_verification_follows_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0-!AIVDM,1,1,,B,15M67FC000G?ufbE`FepT@3n00Sa,0*00").unwrap();

        let lenient = load_plan(file.path(), &ReplayConfig::default()).unwrap();
        assert_eq!(lenient.message_count(), 1);
        assert_eq!(lenient.dropped_groups(), 0);

        let strict = ReplayConfig::default().with_checksum_verification(true);
        let plan = load_plan(file.path(), &strict).unwrap();
        assert_eq!(plan.message_count(), 0);
        assert_eq!(plan.dropped_groups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_replay_sends_bad_checksum_sentence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0-!AIVDM,1,1,,B,15M67FC000G?ufbE`FepT@3n00Sa,0*00").unwrap();
        let plan = load_plan(file.path(), &ReplayConfig::default()).unwrap();

        let mut session = session(plan, RecordingTransmitter::new());
        let report = session.run(CancellationToken::new()).await.unwrap();
        assert_eq!(report.frames, 2);
        assert_eq!(report.dropped_groups, 0);
        assert_eq!(session.dispatcher().transmitter().frames()[0].len(), 168);
    }

    #[tokio::test]
    async fn test_connect_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}/", listener.local_addr().unwrap());
        drop(listener);

        let config = ReplayConfig::default().with_endpoint(endpoint);
        let err = ReplaySession::connect(ReplayPlan::default(), &config).await.err().unwrap();
        assert!(matches!(err, SessionError::Transmit(TransmitError::Connect { .. })));
    }
}
