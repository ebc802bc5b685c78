//! Seeded randomness for trial sampling.
//!
//! Avalanche and BIC draw random base inputs, and NIST template matching
//! pads short input with random bits. All of it comes from a [`TrialRng`]
//! owned by one call.

mod source;

pub use source::TrialRng;
