//! GF(2^8) field and polynomial-ring arithmetic for the white-box generator.
//!
//! This crate provides the two algebraic layers everything else is built on:
//! - byte-level arithmetic in GF(2^8), parametrized by one of 30 fixed
//!   irreducible degree-8 moduli;
//! - variable-length polynomials over GF(2^8) with multiplication, long
//!   division, and extended-Euclid inversion, used to construct diffusion
//!   layers and their exact inverses modulo x^16 + 1.
//!
//! All operations are exact and deterministic; nothing here draws randomness.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod field;
mod poly;

pub use crate::field::{ArithmeticError, Field};
pub use crate::poly::Poly;
