//! Runtime evaluator for generated white-box table sets.
//!
//! This crate is the consumer side of the table contract: per round, sixteen
//! table lookups at the direction's fixed gather positions, XOR-reduced into
//! the next 16-byte state. No key material exists here beyond what the
//! tables embed; encryption and decryption are the same procedure over their
//! respective table sets.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use wbsd_gen::{WbTables, ENTRY_BYTES};

/// A 16-byte cipher block.
pub type Block = [u8; ENTRY_BYTES];

/// Table-driven cipher over one generated table pair.
pub struct WbCipher {
    tables: WbTables,
}

impl WbCipher {
    /// Wraps a generated (and already self-tested) table pair.
    pub fn new(tables: WbTables) -> Self {
        Self { tables }
    }

    /// Number of rounds in each chain.
    pub fn round_count(&self) -> usize {
        self.tables.encrypt.round_count()
    }

    /// Encrypts one block in place.
    pub fn encrypt_block(&self, block: &mut Block) {
        self.tables.encrypt.transform(block);
    }

    /// Decrypts one block in place.
    pub fn decrypt_block(&self, block: &mut Block) {
        self.tables.decrypt.transform(block);
    }

    /// Releases the underlying tables.
    pub fn into_tables(self) -> WbTables {
        self.tables
    }
}
