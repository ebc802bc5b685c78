//! Reduced-round hash analysis library.
//!
//! Runs permutation-based hash primitives with deliberately reduced round
//! counts and measures how far their output falls from random.
//! Implementations are written for analysis, not for production hashing.
//!
//! # Architecture
//!
//! ```text
//! primitives ──► stream ──► analysis (NIST / Diehard / TestU01)
//!     │                         │
//!     └──► differential ────────┴──► orchestrator ──► metrics
//!          (SAC / BIC)
//! ```
//!
//! `numeric` supplies the special functions and `seeding` the per-call
//! trial randomness.
//!
//! # Design Principles
//!
//! - **Pure calls**: every primitive, test and analyzer takes explicit
//!   inputs and shares no mutable state
//! - **Sentinels, not errors**: a test that cannot apply to its input
//!   returns NaN or -1 and the rest of the battery carries on
//! - **Reproducible on request**: pass a seed and a run replays exactly
//!
//! # Example
//!
//! ```no_run
//! use hashround::{
//!     analysis::nist,
//!     primitives::{Algorithm, RoundHasher},
//!     stream::generate,
//! };
//!
//! let hasher = RoundHasher::new(Algorithm::Keccak, 3).unwrap();
//! let bits = generate(&|x: &[u8]| hasher.hash(x), 1_000_000);
//!
//! println!("Monobit p = {:.4}", nist::monobit(&bits));
//! println!("Runs p = {:.4}", nist::runs(&bits));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod differential;
pub mod metrics;
pub mod numeric;
pub mod orchestrator;
pub mod primitives;
pub mod seeding;
pub mod stream;

// Re-export commonly used types at crate root
pub use analysis::{Family, SignificanceThresholds, TestResult, Verdict};
pub use differential::{AvalancheResult, BicResult};
pub use orchestrator::{run, AnalysisConfig, RunParameters, RunReport};
pub use primitives::{Algorithm, PrimitiveError, RoundHasher};
pub use seeding::TrialRng;
pub use stream::{generate, BitString};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
