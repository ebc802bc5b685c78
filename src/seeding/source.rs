//! ChaCha20 trial randomness with BLAKE3-derived child seeds.
//!
//! A `TrialRng` is created once per run, from an explicit `u64` seed when
//! reproducibility is wanted or from OS entropy otherwise. Each analyzer
//! gets its own child stream:
//!
//! ```text
//! child_seed = BLAKE3(domain || parent_seed || label)
//! ```
//!
//! so analyzers running on different threads never share a generator and a
//! seeded run replays exactly.

use blake3::Hasher;
use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use std::fmt;

/// Domain separator for seed derivation.
const SEED_DOMAIN: &[u8] = b"hashround-trial-seed-v1";

/// Per-call pseudo-random source for trial sampling and padding.
pub struct TrialRng {
    inner: ChaCha20Rng,
    /// Seed material the generator was keyed with; children derive from it.
    seed_material: [u8; 32],
    deterministic: bool,
    bytes_drawn: u64,
}

impl TrialRng {
    /// Seeds from `seed` when given, otherwise from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_u64(seed),
            None => Self::from_os_entropy(),
        }
    }

    /// Reproducible generator for a fixed seed.
    pub fn from_u64(seed: u64) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(SEED_DOMAIN);
        hasher.update(&seed.to_le_bytes());
        Self::from_material(*hasher.finalize().as_bytes(), true)
    }

    /// Non-deterministic generator keyed from the OS entropy source.
    pub fn from_os_entropy() -> Self {
        let mut seed_material = [0u8; 32];
        OsRng.fill_bytes(&mut seed_material);
        Self::from_material(seed_material, false)
    }

    fn from_material(seed_material: [u8; 32], deterministic: bool) -> Self {
        Self {
            inner: ChaCha20Rng::from_seed(seed_material),
            seed_material,
            deterministic,
            bytes_drawn: 0,
        }
    }

    /// Independent generator for the analyzer named `label`.
    ///
    /// Depends only on this generator's seed and the label, never on how
    /// many bytes have been drawn.
    pub fn child(&self, label: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(SEED_DOMAIN);
        hasher.update(&self.seed_material);
        hasher.update(label.as_bytes());
        Self::from_material(*hasher.finalize().as_bytes(), self.deterministic)
    }

    /// True when built from an explicit seed.
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// Bytes handed out so far.
    pub fn bytes_drawn(&self) -> u64 {
        self.bytes_drawn
    }

    /// Uniform integer in `0..bound`; `bound` must be positive.
    pub fn below(&mut self, bound: u64) -> u64 {
        debug_assert!(bound > 0);
        // Rejection sampling on the largest multiple of `bound`.
        let zone = u64::MAX - u64::MAX % bound;
        loop {
            let v = self.next_u64();
            if v < zone {
                return v % bound;
            }
        }
    }
}

impl fmt::Debug for TrialRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrialRng")
            .field("deterministic", &self.deterministic)
            .field("bytes_drawn", &self.bytes_drawn)
            .finish_non_exhaustive()
    }
}

impl RngCore for TrialRng {
    fn next_u32(&mut self) -> u32 {
        self.bytes_drawn += 4;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.bytes_drawn += 8;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.bytes_drawn += dest.len() as u64;
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.bytes_drawn += dest.len() as u64;
        self.inner.try_fill_bytes(dest)
    }
}
