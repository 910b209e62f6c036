//! Fragment group decoding.
//!
//! A decoder looks at a window of consecutive raw sentences and says whether
//! they form a whole message, a group still waiting for fragments, or
//! something that can never decode. The answer is a value, never a panic or
//! an error used for control flow.

use crate::payload::Payload;
use crate::sentence::{Sentence, SentenceError};
use apate_core::RawSentence;
use bitvec::prelude::*;

/// Why a window can never decode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Nothing to decode
    #[error("empty window")]
    EmptyWindow,

    /// A sentence in the window is malformed
    #[error("sentence {index} is malformed: {source}")]
    Malformed {
        /// Position within the window
        index: usize,
        /// Parse failure
        #[source]
        source: SentenceError,
    },

    /// The window starts partway through a group
    #[error("window starts at fragment {number} of {count}")]
    OrphanFragment {
        /// Fragment number found
        number: u8,
        /// Group size it claims
        count: u8,
    },

    /// A fragment belongs to a different group than the first one
    #[error("sentence {index} has a different {field} than its group")]
    GroupMismatch {
        /// Position within the window
        index: usize,
        /// Field that differs
        field: &'static str,
    },

    /// Fragments are out of sequence
    #[error("sentence {index} is fragment {found}, expected {expected}")]
    OutOfSequence {
        /// Position within the window
        index: usize,
        /// Fragment number that should follow
        expected: u8,
        /// Fragment number found
        found: u8,
    },
}

/// Result of decoding a window of sentences
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The window is exactly one whole message
    Complete(Payload),
    /// The window is a valid prefix of a group; more fragments are needed
    Incomplete,
    /// The window can never decode
    Unrecoverable(DecodeError),
}

/// Decodes windows of consecutive raw sentences
pub trait FragmentDecoder {
    /// Decode `window`, which starts at a candidate first fragment
    fn decode(&self, window: &[RawSentence]) -> DecodeOutcome;
}

/// Decoder for AIVDM/AIVDO fragment groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AivdmDecoder {
    verify_checksum: bool,
}

impl AivdmDecoder {
    /// Create a decoder; checksum mismatches are tolerated until
    /// [`with_checksum_verification`](Self::with_checksum_verification)
    /// turns verification on
    #[must_use]
    pub fn new() -> Self {
        Self {
            verify_checksum: false,
        }
    }

    /// Enable or disable checksum verification
    #[must_use]
    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    fn check_group(sentences: &[Sentence]) -> Result<(), DecodeError> {
        let Some(first) = sentences.first() else {
            return Err(DecodeError::EmptyWindow);
        };
        if first.fragment_number != 1 {
            return Err(DecodeError::OrphanFragment {
                number: first.fragment_number,
                count: first.fragment_count,
            });
        }

        for (index, sentence) in sentences.iter().enumerate().skip(1) {
            if sentence.fragment_count != first.fragment_count {
                return Err(DecodeError::GroupMismatch {
                    index,
                    field: "fragment count",
                });
            }
            if sentence.sequence_id != first.sequence_id {
                return Err(DecodeError::GroupMismatch {
                    index,
                    field: "sequence id",
                });
            }
            if sentence.channel != first.channel {
                return Err(DecodeError::GroupMismatch {
                    index,
                    field: "channel",
                });
            }
            // index < fragment_count <= 9 here, so this cannot truncate
            let expected = index as u8 + 1;
            if sentence.fragment_number != expected {
                return Err(DecodeError::OutOfSequence {
                    index,
                    expected,
                    found: sentence.fragment_number,
                });
            }
        }
        Ok(())
    }

    fn assemble(sentences: &[Sentence]) -> Payload {
        let mut bits: BitVec<u8, Msb0> = BitVec::new();
        for sentence in sentences {
            bits.extend_from_bitslice(&sentence.payload);
        }
        if let Some(last) = sentences.last() {
            let keep = bits.len().saturating_sub(usize::from(last.fill_bits));
            bits.truncate(keep);
        }
        Payload::from_bits(bits)
    }
}

impl Default for AivdmDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentDecoder for AivdmDecoder {
    fn decode(&self, window: &[RawSentence]) -> DecodeOutcome {
        let mut sentences = Vec::with_capacity(window.len());
        for (index, raw) in window.iter().enumerate() {
            match Sentence::parse(raw.as_str(), self.verify_checksum) {
                Ok(sentence) => sentences.push(sentence),
                Err(source) => {
                    return DecodeOutcome::Unrecoverable(DecodeError::Malformed { index, source });
                }
            }
        }

        if let Err(err) = Self::check_group(&sentences) {
            return DecodeOutcome::Unrecoverable(err);
        }

        // check_group guarantees sentences is non-empty and every fragment
        // shares the first one's count
        let expected = usize::from(sentences[0].fragment_count);
        if sentences.len() < expected {
            DecodeOutcome::Incomplete
        } else {
            DecodeOutcome::Complete(Self::assemble(&sentences))
        }
    }
}
