//! Lane wiring shared by mix chaining, S-box inversion, and the runtime
//! gather step.

use serde::{Deserialize, Serialize};

/// Number of byte lanes in a block.
pub const LANES: usize = 16;

/// Which chain a round or table set belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The forward (encryption) chain.
    Encrypt,
    /// The derived backward (decryption) chain.
    Decrypt,
}

impl Direction {
    /// The direction whose remap undoes this one's.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Encrypt => Direction::Decrypt,
            Direction::Decrypt => Direction::Encrypt,
        }
    }
}

/// The fixed lane permutation used everywhere lanes are rewired: mix-layer
/// composition, S-box inversion, and the per-round gather positions of the
/// runtime. The two directions are inverse permutations of each other.
pub fn lane_remap(direction: Direction, lane: usize) -> usize {
    debug_assert!(lane < LANES);
    match direction {
        Direction::Encrypt => (lane + 4 * (lane % 4)) % LANES,
        Direction::Decrypt => (lane + LANES - 4 * (lane % 4)) % LANES,
    }
}
