//! Real-time replay scheduler.
//!
//! Batches are emitted in ascending timestamp order, each once the wall
//! clock has caught up with its recorded offset. The virtual cursor is
//! resynchronised to real elapsed time after every wait, so time spent
//! transmitting one batch is absorbed by the next wait instead of pushing
//! every later batch back.

use crate::plan::PlannedBatch;
use crate::transmit::{Dispatcher, TransmitError, Transmitter};
use apate_core::TraceTime;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks session start and the virtual elapsed-time cursor
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    start: Instant,
    cursor: Duration,
}

impl Pacer {
    /// Start pacing from now
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            cursor: Duration::ZERO,
        }
    }

    /// Real time since the pacer started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Virtual elapsed time as of the last wait
    #[must_use]
    pub fn cursor(&self) -> Duration {
        self.cursor
    }

    /// Wait until `time` has elapsed since start; returns how long it slept
    ///
    /// Offsets at or behind the cursor return at once. An offset that real
    /// time has already passed does not sleep either, but still moves the
    /// cursor up to real elapsed time.
    pub async fn wait_for(&mut self, time: TraceTime) -> Duration {
        let target = time.as_duration();
        if target <= self.cursor {
            return Duration::ZERO;
        }

        let elapsed = self.elapsed();
        // positive: behind the cursor, negative: ahead of it
        let drift = self.cursor.as_secs_f64() - elapsed.as_secs_f64();
        // (target - cursor) + drift, clamped at zero
        let sleep = target.saturating_sub(elapsed);
        tracing::debug!(
            timestamp = %time,
            drift_secs = drift,
            sleep_secs = sleep.as_secs_f64(),
            "pacing"
        );
        if !sleep.is_zero() {
            tokio::time::sleep(sleep).await;
        }

        self.cursor = self.elapsed();
        sleep
    }
}

/// Drives batches through a dispatcher at their recorded offsets
#[derive(Debug)]
pub struct Scheduler {
    pacer: Pacer,
    batches_emitted: usize,
    messages_sent: usize,
}

impl Scheduler {
    /// Create a scheduler; its clock starts now
    #[must_use]
    pub fn new() -> Self {
        Self {
            pacer: Pacer::start(),
            batches_emitted: 0,
            messages_sent: 0,
        }
    }

    /// The scheduler's pacer
    #[must_use]
    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Batches fully transmitted
    #[must_use]
    pub fn batches_emitted(&self) -> usize {
        self.batches_emitted
    }

    /// Messages fully transmitted
    #[must_use]
    pub fn messages_sent(&self) -> usize {
        self.messages_sent
    }

    /// Emit `batches`, which must already be in ascending time order
    ///
    /// Each batch is dropped as soon as it has been transmitted.
    ///
    /// # Errors
    ///
    /// Returns the first transmission failure; nothing after it is sent
    pub async fn run<T, I>(
        &mut self,
        batches: I,
        dispatcher: &mut Dispatcher<T>,
    ) -> Result<(), TransmitError>
    where
        T: Transmitter,
        I: IntoIterator<Item = PlannedBatch>,
    {
        for batch in batches {
            self.pacer.wait_for(batch.time).await;
            tracing::info!(
                cursor_secs = self.pacer.cursor().as_secs_f64(),
                timestamp = %batch.time,
                messages = batch.messages.len(),
                "transmitting batch"
            );
            for message in &batch.messages {
                dispatcher.dispatch(message).await?;
                self.messages_sent += 1;
            }
            self.batches_emitted += 1;
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
