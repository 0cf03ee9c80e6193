//! Error taxonomy for table generation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the generator.
///
/// Configuration errors abort before any cryptographic work starts; entropy
/// and I/O errors abort the whole run. Arithmetic domain errors are wrapped
/// for completeness but never occur during normal generation, because
/// degenerate random draws are retried rather than propagated.
#[derive(Debug, Error)]
pub enum GenError {
    /// Fewer than two rounds cannot form a cipher chain.
    #[error("round count must be at least 2, got {0}")]
    RoundCount(u32),
    /// The mix-layer bounds are inverted.
    #[error("min mix layers ({min}) exceeds max mix layers ({max})")]
    MixBounds {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },
    /// Field or polynomial arithmetic hit a domain error.
    #[error(transparent)]
    Arithmetic(#[from] gf_core::ArithmeticError),
    /// The OS entropy source is unavailable. Fatal for the run.
    #[error("entropy source failure: {0}")]
    Entropy(String),
    /// The generated chains do not invert each other.
    #[error("self-test failed: encryption and decryption chains are not inverses")]
    SelfTest,
    /// An artifact could not be written.
    #[error("cannot write artifact {path}")]
    Io {
        /// Artifact path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
