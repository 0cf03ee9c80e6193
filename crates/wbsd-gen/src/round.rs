//! Round construction: substitution boxes, diffusion polynomials, and mix
//! layers.

use gf_core::{Field, Poly};
use rand::{CryptoRng, RngCore};

use crate::entropy::Entropy;
use crate::lanes::{lane_remap, Direction, LANES};

/// One lane of a mix layer: multiplication by `mult` in `field`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MixPair {
    /// Non-zero multiplier.
    pub mult: u8,
    /// Field the multiplication happens in.
    pub field: Field,
}

/// A 16-lane multiplicative scrambling layer.
///
/// Each lane carries an independent non-zero multiplier; the moduli are an
/// independently shuffled assignment from the full 30-modulus list, so no
/// two lanes are forced into the same field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixLayer {
    lanes: [MixPair; LANES],
}

impl MixLayer {
    fn random<R: RngCore + CryptoRng>(entropy: &mut Entropy<R>) -> Self {
        let mut moduli: Vec<Field> = (0..Field::COUNT).map(Field::by_index).collect();
        entropy.shuffle(&mut moduli);
        let lanes = std::array::from_fn(|lane| {
            let mult = loop {
                let byte = entropy.next_byte();
                if byte != 0 {
                    break byte;
                }
            };
            MixPair {
                mult,
                field: moduli[lane],
            }
        });
        Self { lanes }
    }

    /// The (multiplier, field) pair for one lane.
    pub fn lane(&self, lane: usize) -> MixPair {
        self.lanes[lane]
    }

    /// Multiplies `value` by this layer's pair at `lane`.
    #[inline]
    pub fn apply(&self, lane: usize, value: u8) -> u8 {
        let pair = self.lanes[lane];
        pair.field.mul(pair.mult, value)
    }
}

/// A 256-entry byte permutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sbox {
    table: Box<[u8; 256]>,
}

impl Sbox {
    /// The identity permutation.
    pub fn identity() -> Self {
        let mut table = Box::new([0u8; 256]);
        for (value, slot) in table.iter_mut().enumerate() {
            *slot = value as u8;
        }
        Self { table }
    }

    /// A uniformly random permutation: the shuffled identity.
    pub fn random<R: RngCore + CryptoRng>(entropy: &mut Entropy<R>) -> Self {
        let mut sbox = Self::identity();
        entropy.shuffle(&mut sbox.table[..]);
        sbox
    }

    /// Looks up the substitution for `value`.
    #[inline]
    pub fn apply(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    /// The inverse permutation.
    pub fn inverted(&self) -> Self {
        let mut table = Box::new([0u8; 256]);
        for (value, &substituted) in self.table.iter().enumerate() {
            table[substituted as usize] = value as u8;
        }
        Self { table }
    }
}

/// Inverts a bank of S-boxes and re-indexes the lanes under the fixed
/// remap, keeping forward and backward lane numbering consistent:
/// `out[lane_remap(direction, i)]` is the inverse permutation of `in[i]`.
pub fn invert_sboxes(sboxes: &[Sbox; LANES], direction: Direction) -> [Sbox; LANES] {
    std::array::from_fn(|target| {
        let source = lane_remap(direction.opposite(), target);
        sboxes[source].inverted()
    })
}

/// Bounds on how many mix layers a round may generate.
#[derive(Clone, Copy, Debug)]
pub struct MixBounds {
    /// Minimum layer count.
    pub min: u32,
    /// Maximum layer count; zero disables mixing entirely.
    pub max: u32,
}

/// A round's diffusion data: the polynomial, its inverse modulo x^16 + 1,
/// and the field both live in.
#[derive(Clone, Debug)]
pub struct Diffusion {
    /// Diffusion polynomial; multiplication by it modulo x^16 + 1 is the
    /// round's linear layer.
    pub poly: Poly,
    /// Multiplicative inverse of `poly` modulo x^16 + 1.
    pub anti_poly: Poly,
    /// Field for all byte arithmetic in the round.
    pub field: Field,
}

impl Diffusion {
    /// Pass-through diffusion used by last rounds: both polynomials are the
    /// constant 1.
    pub fn passthrough(field: Field) -> Self {
        Self {
            poly: Poly::one(),
            anti_poly: Poly::one(),
            field,
        }
    }
}

/// One stage of the transform chain.
///
/// A round is built once by [`Round::fresh`] (random path) or
/// [`Round::from_parts`] (explicit path used for the derived decryption
/// chain) and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct Round {
    clear: [Sbox; LANES],
    effective: [Sbox; LANES],
    diffusion: Diffusion,
    mixes: Vec<MixLayer>,
    direction: Direction,
    is_last: bool,
}

impl Round {
    /// Builds a forward round from scratch: random clear S-boxes, a fresh
    /// invertible diffusion polynomial (except in the last round, which is
    /// pure substitution), and fresh mix layers for the next round to
    /// compensate. `prev_mixes` are the layers inherited from the previous
    /// round of the same chain.
    pub fn fresh<R: RngCore + CryptoRng>(
        entropy: &mut Entropy<R>,
        bounds: MixBounds,
        prev_mixes: &[MixLayer],
        is_last: bool,
    ) -> Self {
        let clear: [Sbox; LANES] = std::array::from_fn(|_| Sbox::random(entropy));
        let diffusion = if is_last {
            Diffusion::passthrough(random_field(entropy))
        } else {
            create_diffusion(entropy)
        };
        Self::assemble(
            entropy,
            clear,
            diffusion,
            bounds,
            prev_mixes,
            Direction::Encrypt,
            is_last,
        )
    }

    /// Builds a decryption round from pre-inverted S-boxes and the diffusion
    /// carried over from the matching forward round.
    pub fn from_parts<R: RngCore + CryptoRng>(
        entropy: &mut Entropy<R>,
        clear: [Sbox; LANES],
        diffusion: Diffusion,
        bounds: MixBounds,
        prev_mixes: &[MixLayer],
        is_last: bool,
    ) -> Self {
        Self::assemble(
            entropy,
            clear,
            diffusion,
            bounds,
            prev_mixes,
            Direction::Decrypt,
            is_last,
        )
    }

    fn assemble<R: RngCore + CryptoRng>(
        entropy: &mut Entropy<R>,
        clear: [Sbox; LANES],
        diffusion: Diffusion,
        bounds: MixBounds,
        prev_mixes: &[MixLayer],
        direction: Direction,
        is_last: bool,
    ) -> Self {
        let effective = effective_sboxes(&clear, prev_mixes, direction);
        let mixes = if is_last {
            Vec::new()
        } else {
            create_mixes(entropy, bounds)
        };
        Self {
            clear,
            effective,
            diffusion,
            mixes,
            direction,
            is_last,
        }
    }

    /// The freshly generated permutations, before mix compensation.
    pub fn clear_sboxes(&self) -> &[Sbox; LANES] {
        &self.clear
    }

    /// The S-box actually burned into tables for `lane`: the clear S-box
    /// composed with every inherited mix layer.
    pub fn effective_sbox(&self, lane: usize) -> &Sbox {
        &self.effective[lane]
    }

    /// The diffusion polynomial.
    pub fn poly(&self) -> &Poly {
        &self.diffusion.poly
    }

    /// The inverse of the diffusion polynomial modulo x^16 + 1.
    pub fn anti_poly(&self) -> &Poly {
        &self.diffusion.anti_poly
    }

    /// The field all byte arithmetic of this round happens in.
    pub fn field(&self) -> Field {
        self.diffusion.field
    }

    /// The diffusion a matching backward round uses: polynomial and inverse
    /// trade places, the field carries over.
    pub fn inverse_diffusion(&self) -> Diffusion {
        Diffusion {
            poly: self.diffusion.anti_poly.clone(),
            anti_poly: self.diffusion.poly.clone(),
            field: self.diffusion.field,
        }
    }

    /// The round's own mix layers, compensated by the next round.
    pub fn mixes(&self) -> &[MixLayer] {
        &self.mixes
    }

    /// Whether this is the chain's final, diffusion-free round.
    pub fn is_last(&self) -> bool {
        self.is_last
    }

    /// The chain this round belongs to.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

fn random_field<R: RngCore + CryptoRng>(entropy: &mut Entropy<R>) -> Field {
    Field::by_index(entropy.next_index(Field::COUNT as u32) as usize)
}

/// The diffusion ring modulus x^16 + 1.
fn ring_modulus() -> Poly {
    Poly::monomial(1, LANES).add(&Poly::one())
}

/// Draws (field, polynomial) pairs until the polynomial inverts modulo
/// x^16 + 1, the inverse has a full set of 16 non-zero coefficients, and the
/// product reduces exactly to 1. Degenerate draws are retried, never
/// reported as errors.
fn create_diffusion<R: RngCore + CryptoRng>(entropy: &mut Entropy<R>) -> Diffusion {
    let modulus = ring_modulus();
    loop {
        let field = random_field(entropy);
        let poly = entropy.next_poly();
        let Some(anti_poly) = poly.inverse_mod(&modulus, field) else {
            continue;
        };
        if anti_poly.len() != LANES || anti_poly.coeffs().iter().any(|&c| c == 0) {
            continue;
        }
        let product = poly.mul(&anti_poly, field);
        let (_, remainder) = product
            .div(&modulus, field)
            .expect("ring modulus is non-zero");
        if remainder != Poly::one() {
            continue;
        }
        return Diffusion {
            poly,
            anti_poly,
            field,
        };
    }
}

/// Composes clear S-boxes with every inherited mix layer. The previous round
/// multiplied its output at position `lane_remap(direction, i)` before this
/// round's lane `i` reads it, so the compensation indexes through the same
/// wiring: `effective[i][mixes(j)] = clear[i][j]`.
fn effective_sboxes(
    clear: &[Sbox; LANES],
    prev_mixes: &[MixLayer],
    direction: Direction,
) -> [Sbox; LANES] {
    if prev_mixes.is_empty() {
        return clear.clone();
    }
    std::array::from_fn(|lane| {
        let wired = lane_remap(direction, lane);
        let mut table = Box::new([0u8; 256]);
        for input in 0..=255u8 {
            let mut index = input;
            for layer in prev_mixes {
                index = layer.apply(wired, index);
            }
            table[index as usize] = clear[lane].apply(input);
        }
        Sbox { table }
    })
}

/// Draws the mix-layer count uniformly in `[min, max]` (fixed at `min` when
/// the bounds agree) and generates that many layers. `max == 0` disables
/// mixing.
fn create_mixes<R: RngCore + CryptoRng>(entropy: &mut Entropy<R>, bounds: MixBounds) -> Vec<MixLayer> {
    debug_assert!(bounds.min <= bounds.max);
    if bounds.max == 0 {
        return Vec::new();
    }
    let count = if bounds.min == bounds.max {
        bounds.min
    } else {
        bounds.min + entropy.next_index(bounds.max - bounds.min + 1)
    };
    (0..count).map(|_| MixLayer::random(entropy)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn seeded(seed: u8) -> Entropy<ChaCha20Rng> {
        Entropy::new(ChaCha20Rng::from_seed([seed; 32]))
    }

    const NO_MIXES: MixBounds = MixBounds { min: 0, max: 0 };

    fn assert_bijective(sbox: &Sbox) {
        let mut seen = [false; 256];
        for value in 0..=255u8 {
            let out = sbox.apply(value) as usize;
            assert!(!seen[out], "duplicate S-box output");
            seen[out] = true;
        }
    }

    #[test]
    fn fresh_rounds_have_bijective_clear_sboxes() {
        let mut entropy = seeded(20);
        let round = Round::fresh(&mut entropy, NO_MIXES, &[], false);
        for lane in 0..LANES {
            assert_bijective(&round.clear_sboxes()[lane]);
        }
    }

    #[test]
    fn diffusion_polynomials_invert_exactly() {
        let mut entropy = seeded(21);
        for _ in 0..4 {
            let round = Round::fresh(&mut entropy, NO_MIXES, &[], false);
            assert_eq!(round.poly().len(), LANES);
            assert_eq!(round.anti_poly().len(), LANES);
            assert!(round.anti_poly().coeffs().iter().all(|&c| c != 0));
            let product = round.poly().mul(round.anti_poly(), round.field());
            let (_, reduced) = product
                .div(&ring_modulus(), round.field())
                .expect("non-zero modulus");
            assert_eq!(reduced, gf_core::Poly::one());
        }
    }

    #[test]
    fn last_rounds_are_pure_substitution() {
        let mut entropy = seeded(22);
        let round = Round::fresh(&mut entropy, MixBounds { min: 2, max: 4 }, &[], true);
        assert!(round.is_last());
        assert_eq!(round.poly(), &Poly::one());
        assert_eq!(round.anti_poly(), &Poly::one());
        assert!(round.mixes().is_empty());
    }

    #[test]
    fn mix_layer_multipliers_are_never_zero() {
        for max in 0..=5u32 {
            for min in 0..=max {
                let mut entropy = seeded(23 + (max * 8 + min) as u8);
                let round = Round::fresh(&mut entropy, MixBounds { min, max }, &[], false);
                let count = round.mixes().len() as u32;
                assert!(count >= min && count <= max);
                for layer in round.mixes() {
                    for lane in 0..LANES {
                        assert_ne!(layer.lane(lane).mult, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn fixed_mix_bounds_produce_exactly_that_many_layers() {
        let mut entropy = seeded(24);
        let round = Round::fresh(&mut entropy, MixBounds { min: 3, max: 3 }, &[], false);
        assert_eq!(round.mixes().len(), 3);
    }

    #[test]
    fn inverting_sboxes_twice_with_matched_remaps_is_the_identity() {
        let mut entropy = seeded(25);
        let original: [Sbox; LANES] = std::array::from_fn(|_| Sbox::random(&mut entropy));
        let forward = invert_sboxes(&original, Direction::Encrypt);
        let back = invert_sboxes(&forward, Direction::Decrypt);
        assert_eq!(back, original);
    }

    #[test]
    fn inverted_sboxes_undo_the_originals_at_remapped_lanes() {
        let mut entropy = seeded(26);
        let original: [Sbox; LANES] = std::array::from_fn(|_| Sbox::random(&mut entropy));
        let inverted = invert_sboxes(&original, Direction::Encrypt);
        for lane in 0..LANES {
            let target = lane_remap(Direction::Encrypt, lane);
            for value in 0..=255u8 {
                assert_eq!(inverted[target].apply(original[lane].apply(value)), value);
            }
        }
    }

    #[test]
    fn effective_equals_clear_without_inherited_mixes() {
        let mut entropy = seeded(27);
        let round = Round::fresh(&mut entropy, NO_MIXES, &[], false);
        for lane in 0..LANES {
            assert_eq!(round.effective_sbox(lane), &round.clear_sboxes()[lane]);
        }
    }

    #[test]
    fn effective_sboxes_compensate_inherited_mixes() {
        let mut entropy = seeded(28);
        let bounds = MixBounds { min: 2, max: 2 };
        let previous = Round::fresh(&mut entropy, bounds, &[], false);
        let round = Round::fresh(&mut entropy, bounds, previous.mixes(), false);
        for lane in 0..LANES {
            let wired = lane_remap(Direction::Encrypt, lane);
            for value in 0..=255u8 {
                let mut mixed = value;
                for layer in previous.mixes() {
                    mixed = layer.apply(wired, mixed);
                }
                assert_eq!(
                    round.effective_sbox(lane).apply(mixed),
                    round.clear_sboxes()[lane].apply(value)
                );
            }
        }
    }
}
