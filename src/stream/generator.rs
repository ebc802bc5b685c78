//! Counter-mode expansion of a hash function into a bit stream.

use super::BitString;
use tracing::warn;

/// Largest stream a single request may produce (2^28 bits).
pub const MAX_STREAM_BITS: usize = 1 << 28;

/// Bit iterator over `hash(counter)` for counter = 0, 1, 2, ...
///
/// The counter is an 8-byte little-endian integer local to this value, so
/// concurrent streams never interfere. Iteration ends early only if the
/// hash returns an empty digest.
pub struct CounterStream<'a, H: ?Sized> {
    hash: &'a H,
    counter: u64,
    digest: Vec<u8>,
    position: usize,
}

impl<'a, H> CounterStream<'a, H>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    /// Starts a stream at counter zero.
    pub fn new(hash: &'a H) -> Self {
        Self {
            hash,
            counter: 0,
            digest: Vec::new(),
            position: 0,
        }
    }

    /// Number of digests computed so far.
    pub fn blocks_hashed(&self) -> u64 {
        self.counter
    }
}

impl<H> Iterator for CounterStream<'_, H>
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.position == self.digest.len() * 8 {
            self.digest = (self.hash)(&self.counter.to_le_bytes());
            self.counter = self.counter.wrapping_add(1);
            self.position = 0;
            if self.digest.is_empty() {
                return None;
            }
        }

        let byte = self.digest[self.position / 8];
        let bit = (byte >> (7 - self.position % 8)) & 1;
        self.position += 1;
        Some(bit)
    }
}

/// Expands `hash` into exactly `n` bits (truncating the last digest).
///
/// Deterministic and prefix-stable. Requests above [`MAX_STREAM_BITS`] are
/// clamped to it.
pub fn generate<H>(hash: &H, n: usize) -> BitString
where
    H: Fn(&[u8]) -> Vec<u8> + ?Sized,
{
    let n = if n > MAX_STREAM_BITS {
        warn!(requested = n, ceiling = MAX_STREAM_BITS, "Clamping bit stream request");
        MAX_STREAM_BITS
    } else {
        n
    };

    let mut bits = Vec::with_capacity(n);
    bits.extend(CounterStream::new(hash).take(n));
    BitString::from_bits(bits)
}
