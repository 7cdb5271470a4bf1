//! Comparison Gadget
//!
//! Proves `a >= b` for operands known to lie in `[0, 2^(n-1))`.
//!
//! # How it works
//! ```text
//! diff = a - b + 2^(n-1)
//! ```
//! With both operands below `2^(n-1)`, `diff` lands in `[1, 2^n)`.
//! It is at least `2^(n-1)` exactly when `a >= b`, so the gadget
//! decomposes `diff` into `n` bits and pins the top bit to one.
//! Range-checking `diff` alone is not enough: `a < b` still yields a
//! value inside `[0, 2^n)`.
//!
//! Callers must range-check the operands themselves (or derive them from
//! range-checked values with a known bound).

use ark_ff::PrimeField;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::range_check::decompose;

/// `2^exp` as a field element.
pub(crate) fn pow2<F: PrimeField>(exp: usize) -> F {
    F::from(2u64).pow([exp as u64])
}

/// Enforce `a >= b` where both operands are below `2^(num_bits - 1)`.
pub fn enforce_gte<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    a: &FpVar<F>,
    b: &FpVar<F>,
    num_bits: usize,
) -> Result<(), SynthesisError> {
    assert!(num_bits >= 2, "comparison needs a sign bit and a magnitude bit");

    let offset = FpVar::constant(pow2::<F>(num_bits - 1));
    let diff = a - b + offset;

    let bits = decompose(cs, &diff, num_bits)?;
    bits[num_bits - 1].enforce_equal(&Boolean::constant(true))
}

/// Enforce `a > b`, i.e. `a >= b + 1`.
///
/// `b + 1` must still fit below `2^(num_bits - 1)`.
pub fn enforce_gt<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    a: &FpVar<F>,
    b: &FpVar<F>,
    num_bits: usize,
) -> Result<(), SynthesisError> {
    let b_plus_one = b + FpVar::constant(F::one());
    enforce_gte(cs, a, &b_plus_one, num_bits)
}
