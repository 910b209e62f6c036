//! Replay plans.
//!
//! A plan is the whole trace already reassembled: every timestamp in
//! ascending order with its complete messages. Building it up front means a
//! malformed trace (or, under the abort policy, a broken group) stops the
//! session before any connection is opened.

use crate::reassemble::{LogicalMessage, Reassembler, ReassemblyError};
use crate::trace::Trace;
use apate_aivdm::FragmentDecoder;
use apate_core::TraceTime;

/// Messages to emit at one timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    /// Offset from trace start
    pub time: TraceTime,
    /// Messages in recorded order
    pub messages: Vec<LogicalMessage>,
}

/// A reassembled trace ready for replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayPlan {
    batches: Vec<PlannedBatch>,
    dropped_groups: usize,
}

impl ReplayPlan {
    /// Reassemble every batch of `trace`
    ///
    /// # Errors
    ///
    /// Returns the first broken group when the reassembler aborts on them
    pub fn build<D: FragmentDecoder>(
        trace: Trace,
        reassembler: &Reassembler<D>,
    ) -> Result<Self, ReassemblyError> {
        let mut plan = Self::default();
        for entry in trace {
            let span = tracing::debug_span!("reassemble", timestamp = %entry.time);
            let _guard = span.enter();

            let reassembled = reassembler.reassemble(&entry.sentences)?;
            plan.dropped_groups += reassembled.dropped.len();
            if reassembled.messages.is_empty() {
                tracing::warn!("no complete messages at this timestamp");
            }
            plan.batches.push(PlannedBatch {
                time: entry.time,
                messages: reassembled.messages,
            });
        }
        Ok(plan)
    }

    /// Number of timestamps
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// True if there is nothing to replay
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total messages across all batches
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.batches.iter().map(|b| b.messages.len()).sum()
    }

    /// Fragment groups skipped while building
    #[must_use]
    pub fn dropped_groups(&self) -> usize {
        self.dropped_groups
    }

    /// Offset of the last batch
    #[must_use]
    pub fn end_time(&self) -> Option<TraceTime> {
        self.batches.last().map(|b| b.time)
    }

    /// Borrow the batches
    #[must_use]
    pub fn batches(&self) -> &[PlannedBatch] {
        &self.batches
    }

    /// Consume the plan, yielding batches in ascending time order
    #[must_use]
    pub fn into_batches(self) -> Vec<PlannedBatch> {
        self.batches
    }
}
