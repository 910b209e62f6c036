//! AIVDM/AIVDO sentence parsing.
//!
//! A sentence looks like
//! `!AIVDM,2,1,3,A,55?MbV02;H;s<HtKR20EHE:0@T4@Dn22222222,0*1C`: address,
//! fragment count, fragment number, sequential message id, radio channel,
//! armored payload and fill bits, followed by a two-digit XOR checksum.

use crate::armor;
use bitvec::prelude::*;

/// Fields in a sentence, address included
const FIELD_COUNT: usize = 7;

/// Largest fragment count the sequence fields can express
const MAX_FRAGMENTS: u8 = 9;

/// Largest number of padding bits on the final armored character
const MAX_FILL_BITS: u8 = 5;

/// Sentence parsing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SentenceError {
    /// Nothing to parse
    #[error("empty sentence")]
    Empty,

    /// First character is neither `!` nor `$`
    #[error("missing start delimiter")]
    MissingStartDelimiter,

    /// No `*hh` suffix
    #[error("missing checksum")]
    MissingChecksum,

    /// Checksum suffix is not two hex digits
    #[error("invalid checksum field '{0}'")]
    InvalidChecksum(String),

    /// Checksum does not match the sentence body
    #[error("checksum mismatch: sentence says {stated:02X}, body hashes to {computed:02X}")]
    ChecksumMismatch {
        /// Checksum written in the sentence
        stated: u8,
        /// Checksum of the body
        computed: u8,
    },

    /// Wrong number of comma-separated fields
    #[error("expected 7 fields, found {found}")]
    FieldCount {
        /// Fields present
        found: usize,
    },

    /// Address is not a VDM or VDO sentence
    #[error("unsupported sentence type '{0}'")]
    Unsupported(String),

    /// A numeric field is out of range or unparsable
    #[error("invalid {field} '{value}'")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Text found
        value: String,
    },

    /// Payload character outside the six-bit alphabet
    #[error("invalid payload character at position {position}")]
    InvalidPayload {
        /// Zero-based position within the payload field
        position: usize,
    },
}

/// Own-vessel or other-vessel report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    /// `VDM`, a report received from another station
    Vdm,
    /// `VDO`, a report about the own vessel
    Vdo,
}

/// A single parsed sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Two-letter talker identifier, e.g. `AI`
    pub talker: String,
    /// VDM or VDO
    pub kind: SentenceKind,
    /// Fragments in the group this sentence belongs to
    pub fragment_count: u8,
    /// 1-based position of this sentence in its group
    pub fragment_number: u8,
    /// Sequential message id shared by the group's fragments
    pub sequence_id: Option<u8>,
    /// Radio channel, usually `A` or `B`
    pub channel: String,
    /// Dearmored payload bits, fill bits included
    pub payload: BitVec<u8, Msb0>,
    /// Padding bits at the end of `payload`
    pub fill_bits: u8,
}

impl Sentence {
    /// Parse a sentence
    ///
    /// When `verify_checksum` is false a mismatching checksum is tolerated,
    /// but the `*hh` suffix must still be present and well formed.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a well-formed VDM/VDO sentence
    pub fn parse(text: &str, verify_checksum: bool) -> Result<Self, SentenceError> {
        let text = text.trim();
        let mut chars = text.chars();
        match chars.next() {
            None => return Err(SentenceError::Empty),
            Some('!' | '$') => {}
            Some(_) => return Err(SentenceError::MissingStartDelimiter),
        }
        let rest = chars.as_str();

        let (body, stated) = rest
            .rsplit_once('*')
            .ok_or(SentenceError::MissingChecksum)?;
        let stated = parse_checksum(stated)?;
        let computed = checksum(body);
        if stated != computed {
            if verify_checksum {
                return Err(SentenceError::ChecksumMismatch { stated, computed });
            }
            tracing::trace!(stated, computed, "ignoring checksum mismatch");
        }

        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(SentenceError::FieldCount { found: fields.len() });
        }

        let (talker, kind) = parse_address(fields[0])?;
        let fragment_count = parse_digit(fields[1])
            .filter(|n| (1..=MAX_FRAGMENTS).contains(n))
            .ok_or_else(|| invalid("fragment count", fields[1]))?;
        let fragment_number = parse_digit(fields[2])
            .filter(|n| (1..=fragment_count).contains(n))
            .ok_or_else(|| invalid("fragment number", fields[2]))?;
        let sequence_id = match fields[3] {
            "" => None,
            id => Some(parse_digit(id).ok_or_else(|| invalid("sequence id", id))?),
        };
        let channel = fields[4].to_string();
        let payload = armor::unarmor(fields[5])
            .map_err(|position| SentenceError::InvalidPayload { position })?;
        let fill_bits = parse_digit(fields[6])
            .filter(|n| *n <= MAX_FILL_BITS && usize::from(*n) <= payload.len())
            .ok_or_else(|| invalid("fill bits", fields[6]))?;

        Ok(Self {
            talker,
            kind,
            fragment_count,
            fragment_number,
            sequence_id,
            channel,
            payload,
            fill_bits,
        })
    }

    /// True if this sentence is a whole message on its own
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.fragment_count == 1
    }

    /// True if this sentence closes its group
    #[must_use]
    pub fn is_last_fragment(&self) -> bool {
        self.fragment_number == self.fragment_count
    }
}

/// XOR of every byte between the start delimiter and `*`
#[must_use]
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

fn parse_checksum(text: &str) -> Result<u8, SentenceError> {
    let text = text.trim_end();
    if text.len() != 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SentenceError::InvalidChecksum(text.to_string()));
    }
    u8::from_str_radix(text, 16).map_err(|_| SentenceError::InvalidChecksum(text.to_string()))
}

fn parse_address(address: &str) -> Result<(String, SentenceKind), SentenceError> {
    let unsupported = || SentenceError::Unsupported(address.to_string());
    if address.len() != 5 || !address.is_ascii() {
        return Err(unsupported());
    }
    let (talker, formatter) = address.split_at(2);
    let kind = match formatter {
        "VDM" => SentenceKind::Vdm,
        "VDO" => SentenceKind::Vdo,
        _ => return Err(unsupported()),
    };
    Ok((talker.to_string(), kind))
}

fn parse_digit(text: &str) -> Option<u8> {
    match text.as_bytes() {
        [d @ b'0'..=b'9'] => Some(d - b'0'),
        _ => None,
    }
}

fn invalid(field: &'static str, value: &str) -> SentenceError {
    SentenceError::InvalidField {
        field,
        value: value.to_string(),
    }
}
