//! Bit sequences under test.

use std::str::FromStr;

/// Error parsing a textual bit string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bit character {found:?} at position {position}")]
pub struct ParseBitStringError {
    /// Offending character.
    pub found: char,
    /// Character index in the input.
    pub position: usize,
}

/// A sequence of binary symbols, one `u8` (0 or 1) per bit.
///
/// Digests are unpacked most-significant bit first, so the first bit of
/// `from_bytes(&[0x80])` is 1.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitString {
    bits: Vec<u8>,
}

impl BitString {
    /// Wraps 0/1 values; any non-zero value is taken as 1.
    pub fn from_bits(mut bits: Vec<u8>) -> Self {
        for bit in &mut bits {
            *bit = u8::from(*bit != 0);
        }
        Self { bits }
    }

    /// Unpacks bytes MSB-first.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(bytes.len() * 8);
        for &byte in bytes {
            for shift in (0..8).rev() {
                bits.push((byte >> shift) & 1);
            }
        }
        Self { bits }
    }

    /// Repeats `pattern` until `len` bits are produced.
    pub fn repeating(pattern: &[u8], len: usize) -> Self {
        if pattern.is_empty() {
            return Self::default();
        }
        Self::from_bits(pattern.iter().copied().cycle().take(len).collect())
    }

    /// The bits as a 0/1 slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if there are no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `index`.
    #[inline]
    pub fn bit(&self, index: usize) -> u8 {
        self.bits[index]
    }

    /// Number of ones.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }

    /// Fraction of ones minus 0.5, in [-0.5, 0.5].
    pub fn bit_bias(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.count_ones() as f64 / self.len() as f64 - 0.5
    }

    /// Reads `width` (<= 64) bits starting at `start` as an MSB-first integer.
    ///
    /// Panics if the range runs past the end.
    pub fn read_uint(&self, start: usize, width: usize) -> u64 {
        debug_assert!(width <= 64);
        self.bits[start..start + width]
            .iter()
            .fold(0u64, |acc, &b| (acc << 1) | u64::from(b))
    }

    /// Non-overlapping `width`-bit integers from the start; the tail is dropped.
    pub fn words(&self, width: usize) -> impl Iterator<Item = u64> + '_ {
        debug_assert!((1..=64).contains(&width));
        self.bits
            .chunks_exact(width)
            .map(|chunk| chunk.iter().fold(0u64, |acc, &b| (acc << 1) | u64::from(b)))
    }

    /// Packs MSB-first; a trailing partial byte is zero-filled.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &b)| acc | (b << (7 - i)))
            })
            .collect()
    }

    /// Appends the bits of `other`.
    pub fn extend_from(&mut self, other: &BitString) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Shortens to at most `len` bits.
    pub fn truncate(&mut self, len: usize) {
        self.bits.truncate(len);
    }

    /// Consumes the string, returning the 0/1 vector.
    pub fn into_bits(self) -> Vec<u8> {
        self.bits
    }
}

impl FromStr for BitString {
    type Err = ParseBitStringError;

    /// Parses '0'/'1' characters; whitespace and '_' are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = Vec::with_capacity(s.len());
        for (position, found) in s.chars().enumerate() {
            match found {
                '0' => bits.push(0),
                '1' => bits.push(1),
                '_' => {}
                c if c.is_whitespace() => {}
                _ => return Err(ParseBitStringError { found, position }),
            }
        }
        Ok(Self { bits })
    }
}

impl std::fmt::Debug for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitString")
            .field("bits", &self.bits.len())
            .field("bit_bias", &format!("{:.4}", self.bit_bias()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_is_msb_first() {
        let bits = BitString::from_bytes(&[0x80, 0x01]);
        assert_eq!(bits.len(), 16);
        assert_eq!(bits.bit(0), 1);
        assert_eq!(bits.bit(7), 0);
        assert_eq!(bits.bit(15), 1);
        assert_eq!(bits.to_bytes(), vec![0x80, 0x01]);
    }

    #[test]
    fn test_parse_and_bias() {
        let bits: BitString = "1111 0000_1010".parse().unwrap();
        assert_eq!(bits.len(), 12);
        assert_eq!(bits.count_ones(), 6);
        assert!(bits.bit_bias().abs() < 1e-12);
        assert_eq!(
            "10x".parse::<BitString>(),
            Err(ParseBitStringError { found: 'x', position: 2 })
        );
    }

    #[test]
    fn test_read_uint_and_words() {
        let bits: BitString = "1011 0001 11".parse().unwrap();
        assert_eq!(bits.read_uint(0, 4), 0b1011);
        assert_eq!(bits.read_uint(4, 6), 0b000111);
        let words: Vec<u64> = bits.words(4).collect();
        assert_eq!(words, vec![0b1011, 0b0001]);
    }

    #[test]
    fn test_repeating_pattern() {
        let bits = BitString::repeating(&[0, 1], 5);
        assert_eq!(bits.as_slice(), &[0, 1, 0, 1, 0]);
        assert!(BitString::repeating(&[], 5).is_empty());
    }

    #[test]
    fn test_all_ones_bias() {
        let bits = BitString::from_bytes(&[0xFF; 100]);
        assert!((bits.bit_bias() - 0.5).abs() < 1e-12);
    }
}
