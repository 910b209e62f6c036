//! apate AIVDM codec
//!
//! Sentence-level handling of AIS `!AIVDM`/`!AIVDO` text: field splitting,
//! checksum verification, six-bit payload dearmoring and assembly of
//! multi-fragment groups into a single payload. Message bodies are not
//! interpreted beyond the header fields used for logging.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod armor;
pub mod decoder;
pub mod payload;
pub mod sentence;

pub use decoder::{AivdmDecoder, DecodeError, DecodeOutcome, FragmentDecoder};
pub use payload::Payload;
pub use sentence::{Sentence, SentenceError, SentenceKind};
