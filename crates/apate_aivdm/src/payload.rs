//! Assembled message payloads.

use bitvec::prelude::*;
use std::fmt;

/// The complete bit payload of one AIS message, fill bits removed
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Payload {
    bits: BitVec<u8, Msb0>,
}

impl Payload {
    /// Wrap assembled bits
    #[must_use]
    pub fn from_bits(bits: BitVec<u8, Msb0>) -> Self {
        Self { bits }
    }

    /// Build from a `'0'`/`'1'` string, `None` on any other character
    #[must_use]
    pub fn from_bit_string(text: &str) -> Option<Self> {
        text.chars()
            .map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect::<Option<BitVec<u8, Msb0>>>()
            .map(Self::from_bits)
    }

    /// Borrow the bits
    #[must_use]
    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }

    /// Number of bits
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True for a zero-length payload
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Serialise as ASCII `'0'`/`'1'` characters, most significant bit first
    #[must_use]
    pub fn to_bit_string(&self) -> String {
        self.bits.iter().map(|bit| if *bit { '1' } else { '0' }).collect()
    }

    /// AIS message type from the first six bits
    #[must_use]
    pub fn message_type(&self) -> Option<u8> {
        self.field(0..6).and_then(|v| u8::try_from(v).ok())
    }

    /// Source MMSI from bits 8..38
    #[must_use]
    pub fn mmsi(&self) -> Option<u32> {
        self.field(8..38)
    }

    fn field(&self, range: std::ops::Range<usize>) -> Option<u32> {
        let bits = self.bits.get(range)?;
        Some(bits.iter().fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit)))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("len", &self.len())
            .field("message_type", &self.message_type())
            .field("mmsi", &self.mmsi())
            .finish()
    }
}
