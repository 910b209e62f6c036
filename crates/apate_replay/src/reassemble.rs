//! Fragment reassembly.
//!
//! Turns one timestamp's batch of raw sentences into whole messages. The
//! batch is scanned left to right with a cursor and a growing window; the
//! decoder decides for each window whether it is a message, a group that
//! needs more fragments, or garbage. Nothing is ever reordered.

use apate_aivdm::{DecodeError, DecodeOutcome, FragmentDecoder, Payload};
use apate_core::{GroupPolicy, RawSentence};

/// A fully reassembled message ready for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalMessage {
    payload: Payload,
    sentences: Vec<RawSentence>,
}

impl LogicalMessage {
    /// The assembled payload
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Sentences consumed to build the message, in recorded order
    #[must_use]
    pub fn sentences(&self) -> &[RawSentence] {
        &self.sentences
    }

    /// Number of fragments the message was split across
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.sentences.len()
    }
}

/// A group that could not be turned into a message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReassemblyError {
    /// The batch ended while a group still needed fragments
    #[error("incomplete fragment group: {fragments} sentence(s) from index {start} never completed")]
    IncompleteGroup {
        /// Batch index of the group's first sentence
        start: usize,
        /// Fragments accumulated before the batch ran out
        fragments: usize,
    },

    /// The sentences can never decode
    #[error("undecodable group: {len} sentence(s) from index {start}: {source}")]
    Unrecoverable {
        /// Batch index of the first dropped sentence
        start: usize,
        /// Sentences dropped
        len: usize,
        /// Decoder's reason
        #[source]
        source: DecodeError,
    },
}

impl ReassemblyError {
    /// Number of raw sentences discarded by this failure
    #[must_use]
    pub fn dropped_sentences(&self) -> usize {
        match self {
            Self::IncompleteGroup { fragments, .. } => *fragments,
            Self::Unrecoverable { len, .. } => *len,
        }
    }
}

/// Messages of one batch, plus the groups that were skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassembled {
    /// Complete messages in recorded order
    pub messages: Vec<LogicalMessage>,
    /// Groups dropped under [`GroupPolicy::Skip`]
    pub dropped: Vec<ReassemblyError>,
}

/// Reassembles batches of raw sentences with a [`FragmentDecoder`]
pub struct Reassembler<D> {
    decoder: D,
    policy: GroupPolicy,
}

impl<D: FragmentDecoder> Reassembler<D> {
    /// Create a reassembler that skips broken groups
    #[must_use]
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            policy: GroupPolicy::Skip,
        }
    }

    /// Set the policy for broken groups
    #[must_use]
    pub fn with_policy(mut self, policy: GroupPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current policy
    #[must_use]
    pub fn policy(&self) -> GroupPolicy {
        self.policy
    }

    /// Scan a batch, reporting every message and every failure in order
    ///
    /// When a group is broken by the sentence that should have continued it,
    /// only the partial group is dropped; the breaking sentence starts a new
    /// window so a valid message right after a broken group survives.
    pub fn scan(&self, batch: &[RawSentence]) -> Vec<Result<LogicalMessage, ReassemblyError>> {
        let mut results = Vec::new();
        let mut cursor = 0;
        let mut len = 1;

        while cursor < batch.len() {
            let end = cursor + len;
            if end > batch.len() {
                results.push(Err(ReassemblyError::IncompleteGroup {
                    start: cursor,
                    fragments: len - 1,
                }));
                break;
            }

            let window = &batch[cursor..end];
            match self.decoder.decode(window) {
                DecodeOutcome::Complete(payload) => {
                    results.push(Ok(LogicalMessage {
                        payload,
                        sentences: window.to_vec(),
                    }));
                    cursor = end;
                    len = 1;
                }
                DecodeOutcome::Incomplete => len += 1,
                DecodeOutcome::Unrecoverable(source) => {
                    let dropped = if len == 1 { 1 } else { len - 1 };
                    results.push(Err(ReassemblyError::Unrecoverable {
                        start: cursor,
                        len: dropped,
                        source,
                    }));
                    cursor += dropped;
                    len = 1;
                }
            }
        }

        results
    }

    /// Reassemble a batch, applying the group policy
    ///
    /// # Errors
    ///
    /// Returns the first broken group under [`GroupPolicy::Abort`]
    pub fn reassemble(&self, batch: &[RawSentence]) -> Result<Reassembled, ReassemblyError> {
        let mut reassembled = Reassembled::default();
        for result in self.scan(batch) {
            match result {
                Ok(message) => reassembled.messages.push(message),
                Err(err) => match self.policy {
                    GroupPolicy::Abort => return Err(err),
                    GroupPolicy::Skip => {
                        tracing::warn!(
                            dropped = err.dropped_sentences(),
                            error = %err,
                            "skipping fragment group"
                        );
                        reassembled.dropped.push(err);
                    }
                },
            }
        }
        Ok(reassembled)
    }
}
