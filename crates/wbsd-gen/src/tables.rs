//! Folded lookup tables and the lookup-and-XOR procedure they drive.

use serde::{Deserialize, Serialize};

use crate::lanes::{lane_remap, Direction, LANES};
use crate::round::Round;

/// Bytes per table entry, equal to the block width.
pub const ENTRY_BYTES: usize = 16;

/// Lookup table for a single lane: 256 input bytes to 16-byte vectors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneTable {
    entries: Vec<[u8; ENTRY_BYTES]>,
}

impl LaneTable {
    fn new_zeroed() -> Self {
        Self {
            entries: vec![[0u8; ENTRY_BYTES]; 256],
        }
    }

    fn set(&mut self, input: u8, entry: [u8; ENTRY_BYTES]) {
        self.entries[input as usize] = entry;
    }

    /// The table entry for `input`.
    #[inline]
    pub fn get(&self, input: u8) -> &[u8; ENTRY_BYTES] {
        &self.entries[input as usize]
    }
}

/// All 16 lane tables of one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTables {
    lanes: Vec<LaneTable>,
}

impl RoundTables {
    /// The table for one lane.
    pub fn lane(&self, lane: usize) -> &LaneTable {
        &self.lanes[lane]
    }
}

/// An ordered chain of round tables for one direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSet {
    direction: Direction,
    rounds: Vec<RoundTables>,
}

impl TableSet {
    /// The chain direction these tables implement.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of rounds in the chain.
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// The tables for one round.
    pub fn round(&self, index: usize) -> &RoundTables {
        &self.rounds[index]
    }

    /// One round of the documented procedure: sixteen lookups, one per lane
    /// at the direction's gather position, XOR-reduced into the output
    /// block.
    pub fn apply_round(&self, index: usize, block: &[u8; ENTRY_BYTES]) -> [u8; ENTRY_BYTES] {
        let tables = &self.rounds[index];
        let mut out = [0u8; ENTRY_BYTES];
        for lane in 0..LANES {
            let input = block[lane_remap(self.direction, lane)];
            let entry = tables.lane(lane).get(input);
            for (slot, &value) in out.iter_mut().zip(entry.iter()) {
                *slot ^= value;
            }
        }
        out
    }

    /// Feeds a block through every round in order.
    pub fn transform(&self, block: &mut [u8; ENTRY_BYTES]) {
        for index in 0..self.rounds.len() {
            *block = self.apply_round(index, block);
        }
    }
}

/// Folds finalized rounds into the table set the runtime consumes.
pub fn fold_rounds(rounds: &[Round], direction: Direction) -> TableSet {
    TableSet {
        direction,
        rounds: rounds.iter().map(fold_round).collect(),
    }
}

/// Folds one round's composed transform into table entries: substitution,
/// the diffusion coefficient for every output position, then the round's
/// own mix layers in order.
fn fold_round(round: &Round) -> RoundTables {
    let mut lanes = Vec::with_capacity(LANES);
    for lane in 0..LANES {
        // The diffusion row this lane contributes: the polynomial rotated by
        // the lane index, or a one-hot pass-through in the last round.
        let mut row = [0u8; LANES];
        for (position, slot) in row.iter_mut().enumerate() {
            *slot = if round.is_last() {
                u8::from(position == lane)
            } else {
                round.poly().coeff((position + LANES - lane) % LANES)
            };
        }
        let mut table = LaneTable::new_zeroed();
        for input in 0..=255u8 {
            let substituted = round.effective_sbox(lane).apply(input);
            let mut entry = [0u8; ENTRY_BYTES];
            for (position, slot) in entry.iter_mut().enumerate() {
                let mut value = round.field().mul(substituted, row[position]);
                for layer in round.mixes() {
                    value = layer.apply(position, value);
                }
                *slot = value;
            }
            table.set(input, entry);
        }
        lanes.push(table);
    }
    RoundTables { lanes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use crate::entropy::Entropy;
    use crate::round::MixBounds;

    fn seeded(seed: u8) -> Entropy<ChaCha20Rng> {
        Entropy::new(ChaCha20Rng::from_seed([seed; 32]))
    }

    #[test]
    fn folded_sets_have_the_documented_shape() {
        let mut entropy = seeded(40);
        let bounds = MixBounds { min: 0, max: 0 };
        let rounds = vec![
            Round::fresh(&mut entropy, bounds, &[], false),
            Round::fresh(&mut entropy, bounds, &[], true),
        ];
        let set = fold_rounds(&rounds, Direction::Encrypt);
        assert_eq!(set.round_count(), 2);
        assert_eq!(set.direction(), Direction::Encrypt);
        for index in 0..2 {
            for lane in 0..LANES {
                assert_eq!(set.round(index).lane(lane).entries.len(), 256);
            }
        }
    }

    #[test]
    fn last_round_tables_reduce_to_substitution_at_gathered_lanes() {
        let mut entropy = seeded(41);
        let bounds = MixBounds { min: 0, max: 0 };
        let round = Round::fresh(&mut entropy, bounds, &[], true);
        let set = fold_rounds(std::slice::from_ref(&round), Direction::Encrypt);

        let block = entropy.draw_block();
        let out = set.apply_round(0, &block);
        for position in 0..LANES {
            let gathered = block[lane_remap(Direction::Encrypt, position)];
            assert_eq!(out[position], round.effective_sbox(position).apply(gathered));
        }
    }

    #[test]
    fn non_last_entries_expand_the_diffusion_polynomial() {
        let mut entropy = seeded(42);
        let bounds = MixBounds { min: 0, max: 0 };
        let round = Round::fresh(&mut entropy, bounds, &[], false);
        let set = fold_rounds(std::slice::from_ref(&round), Direction::Encrypt);

        for lane in [0usize, 3, 9, 15] {
            for input in [0u8, 1, 0x7f, 0xff] {
                let substituted = round.effective_sbox(lane).apply(input);
                let entry = set.round(0).lane(lane).get(input);
                for position in 0..LANES {
                    let coeff = round.poly().coeff((position + LANES - lane) % LANES);
                    assert_eq!(entry[position], round.field().mul(substituted, coeff));
                }
            }
        }
    }

    #[test]
    fn own_mix_layers_scale_every_output_position() {
        let mut entropy = seeded(43);
        let bounds = MixBounds { min: 2, max: 2 };
        let round = Round::fresh(&mut entropy, bounds, &[], false);
        let set = fold_rounds(std::slice::from_ref(&round), Direction::Encrypt);
        assert_eq!(round.mixes().len(), 2);

        let lane = 5usize;
        let input = 0xa7u8;
        let substituted = round.effective_sbox(lane).apply(input);
        let entry = set.round(0).lane(lane).get(input);
        for position in 0..LANES {
            let coeff = round.poly().coeff((position + LANES - lane) % LANES);
            let mut expected = round.field().mul(substituted, coeff);
            for layer in round.mixes() {
                expected = layer.apply(position, expected);
            }
            assert_eq!(entry[position], expected);
        }
    }
}
