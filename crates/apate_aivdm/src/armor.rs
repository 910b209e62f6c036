//! Six-bit ASCII payload armoring.

use bitvec::prelude::*;

/// Bits carried by one armored character
pub const BITS_PER_CHAR: usize = 6;

/// Value of one armored payload character, `None` if outside the alphabet
///
/// The alphabet is `'0'..='W'` (0..=39) followed by `` '`'..='w' `` (40..=63).
#[must_use]
pub fn sixbit_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'W' => Some(ch - b'0'),
        b'`'..=b'w' => Some(ch - b'0' - 8),
        _ => None,
    }
}

/// Dearmor a payload into its bits, most significant bit first
///
/// Returns the zero-based position of the first character outside the
/// alphabet on failure.
pub fn unarmor(text: &str) -> Result<BitVec<u8, Msb0>, usize> {
    let mut bits = BitVec::with_capacity(text.len() * BITS_PER_CHAR);
    for (position, ch) in text.bytes().enumerate() {
        let value = sixbit_value(ch).ok_or(position)?;
        for shift in (0..BITS_PER_CHAR).rev() {
            bits.push((value >> shift) & 1 == 1);
        }
    }
    Ok(bits)
}
