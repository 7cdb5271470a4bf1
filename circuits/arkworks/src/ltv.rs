//! LTVProof Circuit
//!
//! Proves `debt / collateral <= max_ltv / 100` without revealing either
//! amount. Division is removed by cross-multiplying:
//!
//! ```text
//! debt · 100 <= collateral · max_ltv
//! ```
//!
//! # Public Inputs (in order)
//! 1. `max_ltv` (percentage, e.g. 75 = 75%)
//! 2. `collateral_commitment`
//! 3. `debt_commitment`
//!
//! # Circuit Constraints
//! 1. Range check: collateral, debt in [0, 2^64), max_ltv in [0, 2^8)
//! 2. Comparison: collateral · max_ltv >= debt · 100
//! 3. Commitment: collateral_commitment == Poseidon(collateral, collateral_salt)
//! 4. Commitment: debt_commitment == Poseidon(debt, debt_salt)

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::{fp::FpVar, FieldVar}};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_std::marker::PhantomData;

use crate::gadgets::{enforce_gte, enforce_range, PoseidonHasher};
use crate::{LTV_CMP_BITS, PERCENT, RATIO_BITS, VALUE_BITS};

#[derive(Clone)]
pub struct LTVCircuit<F: PrimeField> {
    /// Private: actual collateral amount
    pub collateral: Option<F>,
    /// Private: collateral salt
    pub collateral_salt: Option<F>,
    /// Private: actual debt amount
    pub debt: Option<F>,
    /// Private: debt salt
    pub debt_salt: Option<F>,
    /// Public: maximum LTV percentage
    pub max_ltv: Option<F>,
    /// Public: collateral commitment
    pub collateral_commitment: Option<F>,
    /// Public: debt commitment
    pub debt_commitment: Option<F>,
    _marker: PhantomData<F>,
}

impl<F: PrimeField + Absorb> LTVCircuit<F> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        collateral: F,
        collateral_salt: F,
        debt: F,
        debt_salt: F,
        max_ltv: F,
        collateral_commitment: F,
        debt_commitment: F,
    ) -> Self {
        Self {
            collateral: Some(collateral),
            collateral_salt: Some(collateral_salt),
            debt: Some(debt),
            debt_salt: Some(debt_salt),
            max_ltv: Some(max_ltv),
            collateral_commitment: Some(collateral_commitment),
            debt_commitment: Some(debt_commitment),
            _marker: PhantomData,
        }
    }

    /// Create empty circuit for setup
    pub fn empty() -> Self {
        Self {
            collateral: None,
            collateral_salt: None,
            debt: None,
            debt_salt: None,
            max_ltv: None,
            collateral_commitment: None,
            debt_commitment: None,
            _marker: PhantomData,
        }
    }
}

impl<F: PrimeField + Absorb> ConstraintSynthesizer<F> for LTVCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        // ======== Allocate Private Inputs ========

        let collateral_var = FpVar::new_witness(cs.clone(), || {
            self.collateral.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let collateral_salt_var = FpVar::new_witness(cs.clone(), || {
            self.collateral_salt.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let debt_var = FpVar::new_witness(cs.clone(), || {
            self.debt.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let debt_salt_var = FpVar::new_witness(cs.clone(), || {
            self.debt_salt.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Public Inputs ========

        let max_ltv_var = FpVar::new_input(cs.clone(), || {
            self.max_ltv.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let collateral_commitment_var = FpVar::new_input(cs.clone(), || {
            self.collateral_commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let debt_commitment_var = FpVar::new_input(cs.clone(), || {
            self.debt_commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Constraint 1: Range Checks ========

        enforce_range(cs.clone(), &collateral_var, VALUE_BITS)?;
        enforce_range(cs.clone(), &debt_var, VALUE_BITS)?;
        enforce_range(cs.clone(), &max_ltv_var, RATIO_BITS)?;

        // ======== Constraint 2: debt · 100 <= collateral · max_ltv ========
        // both sides stay below 2^72, well inside the comparison width

        let debt_scaled = &debt_var * FpVar::constant(F::from(PERCENT));
        let collateral_scaled = &collateral_var * &max_ltv_var;
        enforce_gte(cs.clone(), &collateral_scaled, &debt_scaled, LTV_CMP_BITS)?;

        // ======== Constraint 3-4: Commitment Verification ========

        let hasher = PoseidonHasher::<F>::new();

        let computed_collateral = hasher.hash_var(cs.clone(), &[collateral_var, collateral_salt_var])?;
        computed_collateral.enforce_equal(&collateral_commitment_var)?;

        let computed_debt = hasher.hash_var(cs, &[debt_var, debt_salt_var])?;
        computed_debt.enforce_equal(&debt_commitment_var)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::commit;
    use ark_bn254::Fr;
    use ark_relations::r1cs::{ConstraintSystem, SynthesisMode};

    fn test_ltv_circuit(collateral: u64, debt: u64, max_ltv: u64) -> bool {
        let hasher = PoseidonHasher::new();
        let collateral = Fr::from(collateral);
        let debt = Fr::from(debt);
        let collateral_salt = Fr::from(12345u64);
        let debt_salt = Fr::from(67890u64);

        let circuit = LTVCircuit::new(
            collateral,
            collateral_salt,
            debt,
            debt_salt,
            Fr::from(max_ltv),
            commit(&hasher, collateral, collateral_salt),
            commit(&hasher, debt, debt_salt),
        );

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_valid_ltv() {
        // 50 / 100 = 50% <= 80%
        assert!(test_ltv_circuit(100, 50, 80));
    }

    #[test]
    fn test_exact_limit_accepted() {
        // 80 · 100 == 100 · 80
        assert!(test_ltv_circuit(100, 80, 80));
    }

    #[test]
    fn test_one_unit_over_limit_rejected() {
        assert!(!test_ltv_circuit(100, 81, 80));
    }

    #[test]
    fn test_zero_debt() {
        assert!(test_ltv_circuit(1000, 0, 75));
    }

    #[test]
    fn test_large_amounts() {
        // 1e18-scale amounts keep the cross products below the comparison width
        let collateral = 10_000_000_000_000_000_000u64;
        assert!(test_ltv_circuit(collateral, collateral / 4 * 3, 75));
        assert!(!test_ltv_circuit(collateral, collateral / 4 * 3 + 1, 75));
    }

    #[test]
    fn test_swapped_commitments_rejected() {
        let hasher = PoseidonHasher::new();
        let (c, d) = (Fr::from(100u64), Fr::from(50u64));
        let (cs_salt, ds_salt) = (Fr::from(1u64), Fr::from(2u64));

        let circuit = LTVCircuit::new(
            c,
            cs_salt,
            d,
            ds_salt,
            Fr::from(80u64),
            commit(&hasher, d, ds_salt),
            commit(&hasher, c, cs_salt),
        );

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_constraint_count() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(SynthesisMode::Setup);
        LTVCircuit::<Fr>::empty()
            .generate_constraints(cs.clone())
            .unwrap();

        println!("\n=== LTV Circuit R1CS Statistics ===");
        println!("Constraints: {}", cs.num_constraints());
        println!("Witness variables: {}", cs.num_witness_variables());
        assert_eq!(cs.num_instance_variables(), 1 + 3);
    }
}
