//! Chain orchestration: forward rounds, the derived backward chain, and the
//! mandatory round-trip self-test.

use std::path::Path;

use log::{debug, info};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::artifact;
use crate::entropy::Entropy;
use crate::error::GenError;
use crate::lanes::Direction;
use crate::round::{invert_sboxes, Diffusion, MixBounds, Round};
use crate::tables::{fold_rounds, TableSet};

/// Generation parameters, validated before any cryptographic work starts.
#[derive(Clone, Copy, Debug)]
pub struct CreatorConfig {
    /// Number of rounds in each chain; at least 2.
    pub rounds: u32,
    /// Minimum number of mix layers per round.
    pub min_mix_layers: u32,
    /// Maximum number of mix layers per round; must not be below the
    /// minimum. Zero disables mixing.
    pub max_mix_layers: u32,
}

impl CreatorConfig {
    /// Rejects configurations that cannot form a valid chain.
    pub fn validate(&self) -> Result<(), GenError> {
        if self.rounds < 2 {
            return Err(GenError::RoundCount(self.rounds));
        }
        if self.min_mix_layers > self.max_mix_layers {
            return Err(GenError::MixBounds {
                min: self.min_mix_layers,
                max: self.max_mix_layers,
            });
        }
        Ok(())
    }

    fn mix_bounds(&self) -> MixBounds {
        MixBounds {
            min: self.min_mix_layers,
            max: self.max_mix_layers,
        }
    }
}

/// Number of random blocks exercised by the self-test.
const SELF_TEST_BLOCKS: usize = 32;

/// Builds the forward chain, derives the backward chain from it, folds both
/// into lookup tables, and verifies the inverse relationship before handing
/// the tables out.
pub struct CipherCreator<R: RngCore + CryptoRng> {
    config: CreatorConfig,
    entropy: Entropy<R>,
}

impl<R: RngCore + CryptoRng> CipherCreator<R> {
    /// Creates a creator over an injected entropy source, failing fast on an
    /// invalid configuration.
    pub fn new(config: CreatorConfig, rng: R) -> Result<Self, GenError> {
        config.validate()?;
        Ok(Self {
            config,
            entropy: Entropy::new(rng),
        })
    }

    /// Runs one full generation and returns self-tested table sets. Partial
    /// results never escape: on any failure the run aborts with an error.
    pub fn generate(mut self) -> Result<WbTables, GenError> {
        let rounds = self.build_forward();
        let anti_rounds = self.build_backward(&rounds);
        let tables = WbTables {
            encrypt: fold_rounds(&rounds, Direction::Encrypt),
            decrypt: fold_rounds(&anti_rounds, Direction::Decrypt),
        };
        self.self_test(&tables)?;
        info!(
            "generated {} rounds per chain, self-test passed",
            self.config.rounds
        );
        Ok(tables)
    }

    /// Rounds 0..N-2 are fresh rounds chained through their predecessors'
    /// mix layers; round N-1 is the diffusion-free last round.
    fn build_forward(&mut self) -> Vec<Round> {
        let count = self.config.rounds as usize;
        let bounds = self.config.mix_bounds();
        let mut rounds = Vec::with_capacity(count);
        rounds.push(Round::fresh(&mut self.entropy, bounds, &[], false));
        for index in 1..count - 1 {
            let prev = rounds[index - 1].mixes().to_vec();
            rounds.push(Round::fresh(&mut self.entropy, bounds, &prev, false));
        }
        let prev = rounds[count - 2].mixes().to_vec();
        rounds.push(Round::fresh(&mut self.entropy, bounds, &prev, true));
        debug!("forward chain of {count} rounds built");
        rounds
    }

    /// Derives the decryption chain end-to-start. Backward round k inverts
    /// forward round (N-1-k)'s clear S-boxes and reuses forward round
    /// (N-2-k)'s diffusion with polynomial and inverse swapped; the final
    /// backward round is the diffusion-free closer over forward round 0.
    fn build_backward(&mut self, rounds: &[Round]) -> Vec<Round> {
        let count = rounds.len();
        let bounds = self.config.mix_bounds();
        let mut anti_rounds = Vec::with_capacity(count);

        let last = &rounds[count - 1];
        anti_rounds.push(Round::from_parts(
            &mut self.entropy,
            invert_sboxes(last.clear_sboxes(), Direction::Encrypt),
            rounds[count - 2].inverse_diffusion(),
            bounds,
            &[],
            false,
        ));

        for index in (1..=count - 2).rev() {
            let prev = anti_rounds
                .last()
                .expect("backward chain starts non-empty")
                .mixes()
                .to_vec();
            anti_rounds.push(Round::from_parts(
                &mut self.entropy,
                invert_sboxes(rounds[index].clear_sboxes(), Direction::Encrypt),
                rounds[index - 1].inverse_diffusion(),
                bounds,
                &prev,
                false,
            ));
        }

        let prev = anti_rounds
            .last()
            .expect("backward chain starts non-empty")
            .mixes()
            .to_vec();
        anti_rounds.push(Round::from_parts(
            &mut self.entropy,
            invert_sboxes(rounds[0].clear_sboxes(), Direction::Encrypt),
            Diffusion::passthrough(rounds[0].field()),
            bounds,
            &prev,
            true,
        ));
        debug!("backward chain of {count} rounds derived");
        anti_rounds
    }

    /// Round-trips random blocks through both chains in both orders. Tables
    /// are only reported as valid when every block survives.
    fn self_test(&mut self, tables: &WbTables) -> Result<(), GenError> {
        for _ in 0..SELF_TEST_BLOCKS {
            let block = self.entropy.draw_block();

            let mut probe = block;
            tables.encrypt.transform(&mut probe);
            tables.decrypt.transform(&mut probe);
            if probe != block {
                return Err(GenError::SelfTest);
            }

            let mut probe = block;
            tables.decrypt.transform(&mut probe);
            tables.encrypt.transform(&mut probe);
            if probe != block {
                return Err(GenError::SelfTest);
            }
        }
        debug!("self-test passed over {SELF_TEST_BLOCKS} blocks");
        Ok(())
    }
}

impl CipherCreator<OsRng> {
    /// Creates a creator backed directly by the OS entropy source.
    pub fn from_os_entropy(config: CreatorConfig) -> Result<Self, GenError> {
        config.validate()?;
        Ok(Self {
            config,
            entropy: Entropy::from_os()?,
        })
    }
}

/// The self-tested output of one generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WbTables {
    /// Encryption-chain tables.
    pub encrypt: TableSet,
    /// Decryption-chain tables.
    pub decrypt: TableSet,
}

impl WbTables {
    /// Writes both text artifacts with the conventional labels.
    pub fn write_artifacts(
        &self,
        encrypt_path: &Path,
        decrypt_path: &Path,
    ) -> Result<(), GenError> {
        artifact::write(&self.encrypt, artifact::ENCRYPT_LABEL, encrypt_path)?;
        artifact::write(&self.decrypt, artifact::DECRYPT_LABEL, decrypt_path)?;
        Ok(())
    }

    /// Serializes the table pair with `bincode`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserializes a table pair with `bincode`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use gf_core::Poly;

    fn creator(rounds: u32, min: u32, max: u32, seed: u8) -> CipherCreator<ChaCha20Rng> {
        let config = CreatorConfig {
            rounds,
            min_mix_layers: min,
            max_mix_layers: max,
        };
        CipherCreator::new(config, ChaCha20Rng::from_seed([seed; 32])).expect("valid config")
    }

    #[test]
    fn configurations_are_rejected_before_any_work() {
        let config = CreatorConfig {
            rounds: 1,
            min_mix_layers: 0,
            max_mix_layers: 0,
        };
        assert!(matches!(
            CipherCreator::new(config, ChaCha20Rng::from_seed([0u8; 32])),
            Err(GenError::RoundCount(1))
        ));

        let config = CreatorConfig {
            rounds: 4,
            min_mix_layers: 3,
            max_mix_layers: 1,
        };
        assert!(matches!(
            CipherCreator::new(config, ChaCha20Rng::from_seed([0u8; 32])),
            Err(GenError::MixBounds { min: 3, max: 1 })
        ));
    }

    #[test]
    fn chains_have_the_requested_length_and_flags() {
        let mut creator = creator(5, 0, 2, 50);
        let rounds = creator.build_forward();
        let anti_rounds = creator.build_backward(&rounds);
        assert_eq!(rounds.len(), 5);
        assert_eq!(anti_rounds.len(), 5);
        for (index, round) in rounds.iter().enumerate() {
            assert_eq!(round.is_last(), index == 4);
            assert_eq!(round.direction(), Direction::Encrypt);
        }
        for (index, round) in anti_rounds.iter().enumerate() {
            assert_eq!(round.is_last(), index == 4);
            assert_eq!(round.direction(), Direction::Decrypt);
        }
        // Both closers are pure substitution.
        assert_eq!(rounds[4].poly(), &Poly::one());
        assert_eq!(anti_rounds[4].poly(), &Poly::one());
        assert!(anti_rounds[4].mixes().is_empty());
    }

    #[test]
    fn backward_rounds_reuse_forward_diffusion_swapped() {
        let mut creator = creator(6, 0, 0, 51);
        let rounds = creator.build_forward();
        let anti_rounds = creator.build_backward(&rounds);
        let count = rounds.len();
        for k in 0..count - 1 {
            let carrier = &rounds[count - 2 - k];
            assert_eq!(anti_rounds[k].poly(), carrier.anti_poly());
            assert_eq!(anti_rounds[k].anti_poly(), carrier.poly());
            assert_eq!(anti_rounds[k].field(), carrier.field());
        }
        assert_eq!(anti_rounds[count - 1].field(), rounds[0].field());
    }

    #[test]
    fn backward_sboxes_invert_the_mirrored_forward_rounds() {
        let mut creator = creator(4, 0, 0, 52);
        let rounds = creator.build_forward();
        let anti_rounds = creator.build_backward(&rounds);
        let count = rounds.len();
        for k in 0..count {
            let forward = &rounds[count - 1 - k];
            let expected = invert_sboxes(forward.clear_sboxes(), Direction::Encrypt);
            assert_eq!(anti_rounds[k].clear_sboxes(), &expected);
        }
    }

    #[test]
    fn generation_passes_the_self_test() {
        let tables = creator(3, 1, 2, 53).generate().expect("self-test passes");
        assert_eq!(tables.encrypt.round_count(), 3);
        assert_eq!(tables.decrypt.round_count(), 3);
    }

    #[test]
    fn minimal_two_round_chains_invert() {
        let tables = creator(2, 0, 3, 54).generate().expect("self-test passes");
        assert_eq!(tables.encrypt.round_count(), 2);
    }

    #[test]
    fn serialization_round_trips() {
        let tables = creator(2, 0, 0, 55).generate().expect("self-test passes");
        let bytes = tables.to_bytes().expect("serialize");
        let decoded = WbTables::from_bytes(&bytes).expect("deserialize");
        assert_eq!(decoded, tables);
    }
}
