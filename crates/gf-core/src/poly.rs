//! Variable-length polynomials over GF(2^8).
//!
//! Coefficient `i` corresponds to x^i. Values are normalized on
//! construction: no trailing zero high-order coefficient is ever stored, and
//! the zero polynomial is the empty coefficient vector.

use std::cmp::Ordering;

use crate::field::{ArithmeticError, Field};

/// A normalized polynomial over GF(2^8).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Poly {
    coeffs: Vec<u8>,
}

impl Poly {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    /// The constant polynomial 1.
    pub fn one() -> Self {
        Self { coeffs: vec![1] }
    }

    /// Builds a polynomial from coefficients, trimming trailing zeros.
    pub fn from_coeffs(mut coeffs: Vec<u8>) -> Self {
        while coeffs.last() == Some(&0) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    /// The monomial `coeff * x^degree` (zero if `coeff` is zero).
    pub fn monomial(coeff: u8, degree: usize) -> Self {
        if coeff == 0 {
            return Self::zero();
        }
        let mut coeffs = vec![0u8; degree + 1];
        coeffs[degree] = coeff;
        Self { coeffs }
    }

    /// True for the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Number of stored coefficients (degree + 1 for non-zero polynomials).
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// True when no coefficients are stored, i.e. for the zero polynomial.
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// The coefficient of x^index; zero beyond the stored length.
    pub fn coeff(&self, index: usize) -> u8 {
        self.coeffs.get(index).copied().unwrap_or(0)
    }

    /// The stored coefficients, lowest degree first.
    pub fn coeffs(&self) -> &[u8] {
        &self.coeffs
    }

    fn leading(&self) -> u8 {
        self.coeffs.last().copied().unwrap_or(0)
    }

    /// Coefficient-wise XOR. The field has characteristic 2, so this is both
    /// addition and subtraction.
    pub fn add(&self, other: &Self) -> Self {
        let (short, long) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut coeffs = long.coeffs.clone();
        for (slot, &c) in coeffs.iter_mut().zip(short.coeffs.iter()) {
            *slot ^= c;
        }
        Self::from_coeffs(coeffs)
    }

    /// Multiplies by x^count, shifting coefficients toward higher degrees.
    pub fn shl(&self, count: usize) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let mut coeffs = vec![0u8; count];
        coeffs.extend_from_slice(&self.coeffs);
        Self { coeffs }
    }

    /// Divides by x^count, discarding the low coefficients.
    pub fn shr(&self, count: usize) -> Self {
        if count >= self.len() {
            return Self::zero();
        }
        Self::from_coeffs(self.coeffs[count..].to_vec())
    }

    /// Full convolution product. Coefficient pairs combine via field
    /// multiplication and accumulate via XOR; no reduction is applied.
    pub fn mul(&self, other: &Self, field: Field) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut acc = vec![0u8; self.len() + other.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in other.coeffs.iter().enumerate() {
                acc[i + j] ^= field.mul(a, b);
            }
        }
        Self::from_coeffs(acc)
    }

    /// Classic long division; returns `(quotient, remainder)`.
    pub fn div(&self, divisor: &Self, field: Field) -> Result<(Self, Self), ArithmeticError> {
        if divisor.is_zero() {
            return Err(ArithmeticError::ZeroPolynomialDivisor);
        }
        if self.len() < divisor.len() {
            return Ok((Self::zero(), self.clone()));
        }
        // The leading coefficient is non-zero by the normalization invariant.
        let leading_inv = field.inv(divisor.leading())?;
        let mut rem = self.coeffs.clone();
        let mut quot = vec![0u8; self.len() - divisor.len() + 1];
        for top in (divisor.len() - 1..self.len()).rev() {
            let lead = rem[top];
            if lead == 0 {
                continue;
            }
            let shift = top + 1 - divisor.len();
            let factor = field.mul(lead, leading_inv);
            quot[shift] = factor;
            for (offset, &d) in divisor.coeffs.iter().enumerate() {
                rem[shift + offset] ^= field.mul(factor, d);
            }
        }
        rem.truncate(divisor.len() - 1);
        Ok((Self::from_coeffs(quot), Self::from_coeffs(rem)))
    }

    /// Scales so the leading coefficient is 1; zero stays zero.
    pub fn normalize(&self, field: Field) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let scale = field
            .inv(self.leading())
            .expect("leading coefficient is non-zero");
        Self {
            coeffs: self.coeffs.iter().map(|&c| field.mul(c, scale)).collect(),
        }
    }

    /// Extended Euclid: returns `Some(d)` with `(self * d) mod modulus == 1`,
    /// or `None` when `self` and `modulus` are not coprime (callers redraw).
    pub fn inverse_mod(&self, modulus: &Self, field: Field) -> Option<Self> {
        if self.is_zero() || modulus.len() < 2 {
            return None;
        }
        let (mut r0, mut r1) = (modulus.clone(), {
            let (_, rem) = self.div(modulus, field).expect("modulus is non-zero");
            rem
        });
        let (mut t0, mut t1) = (Self::zero(), Self::one());
        while !r1.is_zero() {
            let (q, r2) = r0.div(&r1, field).expect("euclid divisor is non-zero");
            let t2 = t0.add(&q.mul(&t1, field));
            r0 = r1;
            r1 = r2;
            t0 = t1;
            t1 = t2;
        }
        if r0.len() != 1 {
            return None;
        }
        let scale = field
            .inv(r0.coeff(0))
            .expect("gcd of coprime polynomials is a non-zero constant");
        let scaled = Self {
            coeffs: t0.coeffs.iter().map(|&c| field.mul(c, scale)).collect(),
        };
        let (_, reduced) = scaled.div(modulus, field).expect("modulus is non-zero");
        Some(reduced)
    }
}

impl PartialOrd for Poly {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Poly {
    /// Compares by length first, then coefficients from highest degree down.
    fn cmp(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.coeffs.iter().rev().cmp(other.coeffs.iter().rev()))
    }
}
