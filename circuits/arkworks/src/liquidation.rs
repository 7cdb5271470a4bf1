//! LiquidationProof Circuit
//!
//! Proves a position's health factor is below 1.0 at a public price:
//!
//! ```text
//! HF = (collateral · price · liq_threshold) / (debt · 100 · PRICE_SCALE)
//! HF < 1.0  ⟺  collateral · price · liq_threshold < debt · 100 · PRICE_SCALE
//! ```
//!
//! The inequality is strict: a position sitting exactly at HF = 1.0 is
//! still safe. `price` carries 8 decimals (PRICE_SCALE = 1e8).
//!
//! # Public Inputs (in order)
//! 1. `price`
//! 2. `liq_threshold` (percentage)
//! 3. `position_hash`
//!
//! # Circuit Constraints
//! 1. Range check: collateral, debt, price in [0, 2^64), liq_threshold in [0, 2^8)
//! 2. Comparison: debt · 100 · PRICE_SCALE > collateral · price · liq_threshold
//! 3. Position hash: position_hash == Poseidon(collateral, debt, salt)

use ark_crypto_primitives::sponge::Absorb;
use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::{fp::FpVar, FieldVar}};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_std::marker::PhantomData;

use crate::gadgets::{enforce_gt, enforce_range, PoseidonHasher};
use crate::{LIQUIDATION_CMP_BITS, PERCENT, PRICE_SCALE, RATIO_BITS, VALUE_BITS};

#[derive(Clone)]
pub struct LiquidationCircuit<F: PrimeField> {
    /// Private: collateral amount
    pub collateral: Option<F>,
    /// Private: debt amount
    pub debt: Option<F>,
    /// Private: position salt
    pub salt: Option<F>,
    /// Public: oracle price (8 decimals)
    pub price: Option<F>,
    /// Public: liquidation threshold percentage
    pub liquidation_threshold: Option<F>,
    /// Public: hash of (collateral, debt, salt)
    pub position_hash: Option<F>,
    _marker: PhantomData<F>,
}

impl<F: PrimeField + Absorb> LiquidationCircuit<F> {
    pub fn new(
        collateral: F,
        debt: F,
        salt: F,
        price: F,
        liquidation_threshold: F,
        position_hash: F,
    ) -> Self {
        Self {
            collateral: Some(collateral),
            debt: Some(debt),
            salt: Some(salt),
            price: Some(price),
            liquidation_threshold: Some(liquidation_threshold),
            position_hash: Some(position_hash),
            _marker: PhantomData,
        }
    }

    /// Create empty circuit for setup
    pub fn empty() -> Self {
        Self {
            collateral: None,
            debt: None,
            salt: None,
            price: None,
            liquidation_threshold: None,
            position_hash: None,
            _marker: PhantomData,
        }
    }
}

impl<F: PrimeField + Absorb> ConstraintSynthesizer<F> for LiquidationCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        // ======== Allocate Private Inputs ========

        let collateral_var = FpVar::new_witness(cs.clone(), || {
            self.collateral.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let debt_var = FpVar::new_witness(cs.clone(), || {
            self.debt.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let salt_var = FpVar::new_witness(cs.clone(), || {
            self.salt.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Public Inputs ========

        let price_var = FpVar::new_input(cs.clone(), || {
            self.price.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let threshold_var = FpVar::new_input(cs.clone(), || {
            self.liquidation_threshold.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let position_hash_var = FpVar::new_input(cs.clone(), || {
            self.position_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Constraint 1: Range Checks ========

        enforce_range(cs.clone(), &collateral_var, VALUE_BITS)?;
        enforce_range(cs.clone(), &debt_var, VALUE_BITS)?;
        enforce_range(cs.clone(), &price_var, VALUE_BITS)?;
        enforce_range(cs.clone(), &threshold_var, RATIO_BITS)?;

        // ======== Constraint 2: HF < 1.0 ========
        // lhs < 2^136, rhs < 2^98

        let collateral_value = &collateral_var * &price_var * &threshold_var;
        let debt_value = &debt_var * FpVar::constant(F::from(PERCENT * PRICE_SCALE));
        enforce_gt(cs.clone(), &debt_value, &collateral_value, LIQUIDATION_CMP_BITS)?;

        // ======== Constraint 3: Position Hash ========

        let hasher = PoseidonHasher::<F>::new();
        let computed = hasher.hash_var(cs, &[collateral_var, debt_var, salt_var])?;
        computed.enforce_equal(&position_hash_var)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::commit_position;
    use ark_bn254::Fr;
    use ark_relations::r1cs::{ConstraintSystem, SynthesisMode};

    fn test_liquidation_circuit(collateral: u64, debt: u64, price: u64, liq_threshold: u64) -> bool {
        let hasher = PoseidonHasher::new();
        let collateral = Fr::from(collateral);
        let debt = Fr::from(debt);
        let salt = Fr::from(99999u64);
        let position_hash = commit_position(&hasher, collateral, debt, salt);

        let circuit = LiquidationCircuit::new(
            collateral,
            debt,
            salt,
            Fr::from(price),
            Fr::from(liq_threshold),
            position_hash,
        );

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_liquidatable_position() {
        // 10 units @ $1500, 80% → $12,000 risk-adjusted against $20,000 debt
        assert!(test_liquidation_circuit(10, 20_000, 1500 * PRICE_SCALE, 80));
    }

    #[test]
    fn test_healthy_position() {
        // 10 units @ $2000, 80% → $16,000 against $10,000 debt
        assert!(!test_liquidation_circuit(10, 10_000, 2000 * PRICE_SCALE, 80));
    }

    #[test]
    fn test_exact_threshold_is_not_liquidatable() {
        // 100 · $100 · 85% == 8500 → HF exactly 1.0
        assert!(!test_liquidation_circuit(100, 8500, 100 * PRICE_SCALE, 85));
    }

    #[test]
    fn test_one_unit_past_threshold_is_liquidatable() {
        assert!(test_liquidation_circuit(100, 8501, 100 * PRICE_SCALE, 85));
    }

    #[test]
    fn test_zero_debt_is_never_liquidatable() {
        assert!(!test_liquidation_circuit(0, 0, 100 * PRICE_SCALE, 85));
    }

    #[test]
    fn test_extreme_values_do_not_wrap() {
        // the product is ~2^134; a wrapping comparison would accept this
        assert!(!test_liquidation_circuit(u64::MAX, u64::MAX, u64::MAX, 100));
    }

    #[test]
    fn test_wrong_position_hash_rejected() {
        let hasher = PoseidonHasher::new();
        let salt = Fr::from(5u64);
        let honest = commit_position(&hasher, Fr::from(100u64), Fr::from(20_000u64), salt);

        // claim a bigger debt against the hash of the real position
        let circuit = LiquidationCircuit::new(
            Fr::from(100u64),
            Fr::from(90_000u64),
            salt,
            Fr::from(100 * PRICE_SCALE),
            Fr::from(85u64),
            honest,
        );
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_constraint_count() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(SynthesisMode::Setup);
        LiquidationCircuit::<Fr>::empty()
            .generate_constraints(cs.clone())
            .unwrap();

        println!("\n=== Liquidation Circuit R1CS Statistics ===");
        println!("Constraints: {}", cs.num_constraints());
        println!("Witness variables: {}", cs.num_witness_variables());
        assert_eq!(cs.num_instance_variables(), 1 + 3);
    }
}
