//! White-box table generation for a substitution-diffusion block cipher.
//!
//! The generator compiles a randomly drawn cipher into dense lookup tables
//! that embed all key material: per round, 16 lane tables mapping an input
//! byte to a 16-byte vector, consumed by a runtime that only performs table
//! lookups and XOR reduction. Round transforms chain through compensating
//! mix layers, the decryption chain is derived from the encryption chain,
//! and both chains are verified to compose to the identity before any table
//! set is reported as valid.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod artifact;
mod cipher;
mod entropy;
mod error;
mod lanes;
mod round;
mod tables;

pub use crate::cipher::{CipherCreator, CreatorConfig, WbTables};
pub use crate::entropy::Entropy;
pub use crate::error::GenError;
pub use crate::lanes::{lane_remap, Direction, LANES};
pub use crate::round::{invert_sboxes, Diffusion, MixBounds, MixLayer, MixPair, Round, Sbox};
pub use crate::tables::{fold_rounds, LaneTable, RoundTables, TableSet, ENTRY_BYTES};
