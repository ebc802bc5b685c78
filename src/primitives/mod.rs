//! Round-parameterized hash primitives.
//!
//! Each variant is a pure function `(input, rounds) -> digest` with no
//! hidden state, so one [`RoundHasher`] can be shared freely between
//! threads. Selection goes through the closed [`Algorithm`] enum.
//!
//! | Algorithm | Rounds | Full | Digest |
//! |-----------|--------|------|--------|
//! | Keccak    | 1..=24 | 24   | 32 B (SHA3-256 at 24) |
//! | Blake     | 1..=14 | 14   | 32 B (BLAKE-256) |
//! | Blake2s   | 1..=12 | 10   | 32 B |
//! | Blake2b   | 1..=12 | 12   | 32 B (up to 64 via [`blake2b_digest`]) |
//! | Blake3    | 1..=14 | 7    | 32 B (single chunk, identity schedule) |

mod blake256;
mod blake2b;
mod blake2s;
mod blake3;
mod keccak;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// SHA-256 initial hash value, shared by BLAKE-256, BLAKE2s and the BLAKE3 variant.
pub(crate) const IV32: [u32; 8] = [
    0x6A09_E667, 0xBB67_AE85, 0x3C6E_F372, 0xA54F_F53A,
    0x510E_527F, 0x9B05_688C, 0x1F83_D9AB, 0x5BE0_CD19,
];

/// Message schedule of the BLAKE family; round r uses row r mod 10.
pub(crate) const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

/// Errors raised by the primitive layer. These are the only errors that
/// abort a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimitiveError {
    /// Round count outside the variant's supported range.
    #[error("{algorithm} supports {min}..={max} rounds, got {rounds}")]
    InvalidRounds {
        /// Variant that rejected the count.
        algorithm: Algorithm,
        /// Requested rounds.
        rounds: u32,
        /// Smallest supported count.
        min: u32,
        /// Largest supported count.
        max: u32,
    },

    /// Name not recognized by the factory.
    #[error("unknown hash algorithm: {0:?}")]
    UnknownAlgorithm(String),

    /// BLAKE2b digest length outside 1..=64.
    #[error("BLAKE2b digest length must be 1..=64 bytes, got {0}")]
    InvalidDigestLength(usize),
}

/// The closed set of hash variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Keccak sponge with SHA3-256 parameters.
    Keccak,
    /// BLAKE-256.
    Blake,
    /// BLAKE2s-256.
    Blake2s,
    /// BLAKE2b truncated to 32 bytes.
    Blake2b,
    /// Single-chunk BLAKE3-like compression.
    Blake3,
}

impl Algorithm {
    /// Every variant, in factory order.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Keccak,
        Algorithm::Blake,
        Algorithm::Blake2s,
        Algorithm::Blake2b,
        Algorithm::Blake3,
    ];

    /// Canonical factory name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Keccak => "Keccak",
            Algorithm::Blake => "Blake",
            Algorithm::Blake2s => "Blake2s",
            Algorithm::Blake2b => "Blake2b",
            Algorithm::Blake3 => "Blake3",
        }
    }

    /// Supported round counts.
    pub fn round_bounds(self) -> RangeInclusive<u32> {
        match self {
            Algorithm::Keccak => 1..=24,
            Algorithm::Blake | Algorithm::Blake3 => 1..=14,
            Algorithm::Blake2s | Algorithm::Blake2b => 1..=12,
        }
    }

    /// Round count of the unreduced algorithm.
    pub fn full_rounds(self) -> u32 {
        match self {
            Algorithm::Keccak => 24,
            Algorithm::Blake => 14,
            Algorithm::Blake2s => 10,
            Algorithm::Blake2b => 12,
            Algorithm::Blake3 => 7,
        }
    }

    /// Digest width in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Algorithm::Keccak => keccak::DIGEST_LEN,
            Algorithm::Blake => blake256::DIGEST_LEN,
            Algorithm::Blake2s => blake2s::DIGEST_LEN,
            Algorithm::Blake2b => blake2b::DIGEST_LEN,
            Algorithm::Blake3 => blake3::DIGEST_LEN,
        }
    }

    /// Fails with [`PrimitiveError::InvalidRounds`] outside [`Self::round_bounds`].
    pub fn check_rounds(self, rounds: u32) -> Result<(), PrimitiveError> {
        let bounds = self.round_bounds();
        if bounds.contains(&rounds) {
            Ok(())
        } else {
            Err(PrimitiveError::InvalidRounds {
                algorithm: self,
                rounds,
                min: *bounds.start(),
                max: *bounds.end(),
            })
        }
    }

    /// Hashes `input` with the given round count.
    pub fn compute_hash(self, input: &[u8], rounds: u32) -> Result<Vec<u8>, PrimitiveError> {
        self.check_rounds(rounds)?;
        Ok(self.hash_unchecked(input, rounds))
    }

    fn hash_unchecked(self, input: &[u8], rounds: u32) -> Vec<u8> {
        match self {
            Algorithm::Keccak => keccak::hash(input, rounds),
            Algorithm::Blake => blake256::hash(input, rounds),
            Algorithm::Blake2s => blake2s::hash(input, rounds),
            Algorithm::Blake2b => blake2b::hash(input, rounds),
            Algorithm::Blake3 => blake3::hash(input, rounds),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = PrimitiveError;

    /// Case-insensitive lookup of the factory names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PrimitiveError::UnknownAlgorithm(s.to_string()))
    }
}

/// BLAKE2b with an explicit digest length in 1..=64 bytes.
pub fn blake2b_digest(input: &[u8], rounds: u32, out_len: usize) -> Result<Vec<u8>, PrimitiveError> {
    Algorithm::Blake2b.check_rounds(rounds)?;
    if !(1..=blake2b::MAX_DIGEST_LEN).contains(&out_len) {
        return Err(PrimitiveError::InvalidDigestLength(out_len));
    }
    Ok(blake2b::hash_with_len(input, rounds, out_len))
}

/// An algorithm bound to a validated round count.
///
/// This is the hash closure handed to stream-driven tests and the
/// differential analyzers; hashing through it cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundHasher {
    algorithm: Algorithm,
    rounds: u32,
}

impl RoundHasher {
    /// Validates `rounds` against the algorithm's bounds.
    pub fn new(algorithm: Algorithm, rounds: u32) -> Result<Self, PrimitiveError> {
        algorithm.check_rounds(rounds)?;
        Ok(Self { algorithm, rounds })
    }

    /// The unreduced variant of `algorithm`.
    pub fn full(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            rounds: algorithm.full_rounds(),
        }
    }

    /// Bound algorithm.
    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Bound round count.
    #[inline]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Digest width in bytes.
    #[inline]
    pub fn digest_len(&self) -> usize {
        self.algorithm.digest_len()
    }

    /// Hashes `input`.
    pub fn hash(&self, input: &[u8]) -> Vec<u8> {
        self.algorithm.hash_unchecked(input, self.rounds)
    }
}
