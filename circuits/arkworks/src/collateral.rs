//! CollateralProof Circuit
//!
//! Proves the committed collateral covers a public threshold without
//! revealing the amount.
//!
//! # Public Inputs (in order)
//! 1. `threshold`
//! 2. `commitment`
//!
//! # Circuit Constraints
//! 1. Range check: collateral in [0, 2^64)
//! 2. Range check: threshold in [0, 2^64)
//! 3. Comparison: collateral >= threshold
//! 4. Commitment: commitment == Poseidon(collateral, salt)

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_std::marker::PhantomData;

use crate::gadgets::{enforce_gte, enforce_range, PoseidonHasher};
use crate::{VALUE_BITS, VALUE_CMP_BITS};

#[derive(Clone)]
pub struct CollateralCircuit<F: PrimeField> {
    /// Private: actual collateral amount
    pub collateral: Option<F>,
    /// Private: salt for commitment
    pub salt: Option<F>,
    /// Public: minimum threshold
    pub threshold: Option<F>,
    /// Public: commitment to collateral
    pub commitment: Option<F>,
    _marker: PhantomData<F>,
}

impl<F: PrimeField + Absorb> CollateralCircuit<F> {
    pub fn new(collateral: F, salt: F, threshold: F, commitment: F) -> Self {
        Self {
            collateral: Some(collateral),
            salt: Some(salt),
            threshold: Some(threshold),
            commitment: Some(commitment),
            _marker: PhantomData,
        }
    }

    /// Create empty circuit for setup
    pub fn empty() -> Self {
        Self {
            collateral: None,
            salt: None,
            threshold: None,
            commitment: None,
            _marker: PhantomData,
        }
    }
}

impl<F: PrimeField + Absorb> ConstraintSynthesizer<F> for CollateralCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        // ======== Allocate Private Inputs ========

        let collateral_var = FpVar::new_witness(cs.clone(), || {
            self.collateral.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let salt_var = FpVar::new_witness(cs.clone(), || {
            self.salt.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Public Inputs ========

        let threshold_var = FpVar::new_input(cs.clone(), || {
            self.threshold.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let commitment_var = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Constraint 1-2: Range Checks ========

        enforce_range(cs.clone(), &collateral_var, VALUE_BITS)?;
        enforce_range(cs.clone(), &threshold_var, VALUE_BITS)?;

        // ======== Constraint 3: collateral >= threshold ========

        enforce_gte(cs.clone(), &collateral_var, &threshold_var, VALUE_CMP_BITS)?;

        // ======== Constraint 4: Commitment Verification ========

        let hasher = PoseidonHasher::<F>::new();
        let computed = hasher.hash_var(cs, &[collateral_var, salt_var])?;
        computed.enforce_equal(&commitment_var)?;

        Ok(())
    }
}
