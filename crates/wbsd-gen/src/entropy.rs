//! Injected randomness: block draws, unbiased indices, and shuffling.

use gf_core::Poly;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::GenError;
use crate::lanes::LANES;

/// Randomness capability handed to every component that draws.
///
/// Every scalar draw consumes one 16-byte block from the underlying
/// generator, mirroring how the table formats themselves are block-shaped.
/// Injecting the generator (rather than reaching for a process-wide source)
/// keeps generation reproducible under a seeded CSPRNG in tests.
pub struct Entropy<R> {
    rng: R,
}

impl<R: RngCore + CryptoRng> Entropy<R> {
    /// Wraps a cryptographically strong generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// One 16-byte draw.
    pub fn draw_block(&mut self) -> [u8; 16] {
        let mut block = [0u8; 16];
        self.rng.fill_bytes(&mut block);
        block
    }

    /// A 32-bit draw: the first four bytes of a block, little-endian.
    pub fn next_u32(&mut self) -> u32 {
        let block = self.draw_block();
        u32::from_le_bytes([block[0], block[1], block[2], block[3]])
    }

    /// An 8-bit draw: the first byte of a block.
    pub fn next_byte(&mut self) -> u8 {
        self.draw_block()[0]
    }

    /// A 16-coefficient polynomial. Raw zero bytes are forced to 1, so the
    /// result always has full length and no zero coefficient.
    pub fn next_poly(&mut self) -> Poly {
        let mut block = self.draw_block();
        for byte in block.iter_mut() {
            if *byte == 0 {
                *byte = 1;
            }
        }
        debug_assert_eq!(block.len(), LANES);
        Poly::from_coeffs(block.to_vec())
    }

    /// Unbiased draw in `[0, bound)` by rejection sampling.
    pub fn next_index(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        let accept = (1u64 << 32) / u64::from(bound) * u64::from(bound);
        loop {
            let draw = self.next_u32();
            if u64::from(draw) < accept {
                return draw % bound;
            }
        }
    }

    /// Unbiased in-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl Entropy<OsRng> {
    /// An OS-backed source. Probes the OS generator once and fails with
    /// [`GenError::Entropy`] when it is unavailable; a failure on a later
    /// draw aborts the run.
    pub fn from_os() -> Result<Self, GenError> {
        let mut probe = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut probe)
            .map_err(|error| GenError::Entropy(error.to_string()))?;
        Ok(Self::new(OsRng))
    }
}
