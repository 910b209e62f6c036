//! Test fixtures shared across modules.

use crate::transmit::{TransmitError, Transmitter};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Type 1 position report, one fragment
pub const SINGLE: &str = "!AIVDM,1,1,,B,15M67FC000G?ufbE`FepT@3n00Sa,0*5C";
/// Another type 1 report, one fragment
pub const SINGLE_OTHER: &str = "!AIVDM,1,1,,A,13aEOK?P00PD2wVMdLDRhgvL289?,0*26";
/// Type 5 static data, fragment 1 of 2
pub const PART_ONE: &str =
    "!AIVDM,2,1,1,A,55?MbV02;H;s<HtKR20EHE:0@T4@Dn2222222216L961O5Gf0NSQEp6ClRp8,0*1C";
/// Type 5 static data, fragment 2 of 2
pub const PART_TWO: &str = "!AIVDM,2,2,1,A,88888888880,2*25";

/// Captures frames with the (tokio) time they were written
pub struct RecordingTransmitter {
    origin: Instant,
    frames: Vec<String>,
    sent_at: Vec<Duration>,
    fail_after: Option<usize>,
    delay: Duration,
    closed: bool,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            frames: Vec::new(),
            sent_at: Vec::new(),
            fail_after: None,
            delay: Duration::ZERO,
            closed: false,
        }
    }

    /// Fails every write after the first `n`
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new()
        }
    }

    /// Spends `delay` on every write, as a slow link would
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Offsets from construction at which each frame was written
    pub fn sent_at(&self) -> &[Duration] {
        &self.sent_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl Transmitter for RecordingTransmitter {
    async fn transmit(&mut self, frame: &str) -> Result<(), TransmitError> {
        if self.closed || self.fail_after.is_some_and(|n| self.frames.len() >= n) {
            return Err(TransmitError::Closed);
        }
        self.sent_at.push(self.origin.elapsed());
        self.frames.push(frame.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransmitError> {
        self.closed = true;
        Ok(())
    }
}
