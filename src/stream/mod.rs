//! Bit strings and counter-mode stream expansion.

mod bitstring;
mod generator;

pub use bitstring::{BitString, ParseBitStringError};
pub use generator::{generate, CounterStream, MAX_STREAM_BITS};
