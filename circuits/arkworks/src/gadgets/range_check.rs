//! Range Check Gadget (bit decomposition)
//!
//! Proves `value ∈ [0, 2^n)` by witnessing `n` boolean bits and enforcing
//! that their little-endian recomposition equals `value`.
//!
//! # Constraints
//! - `n` booleanity constraints (`b·(1-b) = 0`)
//! - 1 linear recomposition constraint
//!
//! `n` must stay below the field's modulus bit size; otherwise the
//! recomposition could wrap and a large value would slip through.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Witness the `num_bits` low bits of `value` and bind them to it.
///
/// Returns the bits in little-endian order so callers can inspect
/// individual positions (the comparison gadget reads the top bit).
pub fn decompose<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    value: &FpVar<F>,
    num_bits: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    assert!(num_bits > 0, "range check needs at least one bit");
    assert!(
        num_bits < F::MODULUS_BIT_SIZE as usize,
        "range of {} bits would wrap the field",
        num_bits
    );

    let bits = (0..num_bits)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                value.value().map(|v| v.into_bigint().get_bit(i))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Σ bit_i · 2^i == value
    Boolean::le_bits_to_fp_var(&bits)?.enforce_equal(value)?;

    Ok(bits)
}

/// Enforce `value ∈ [0, 2^num_bits)`.
pub fn enforce_range<F: PrimeField>(
    cs: ConstraintSystemRef<F>,
    value: &FpVar<F>,
    num_bits: usize,
) -> Result<(), SynthesisError> {
    decompose(cs, value, num_bits).map(|_| ())
}
