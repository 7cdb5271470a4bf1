//! Poseidon hash over the proof field
//!
//! Sponge of width 3 (rate 2, capacity 1) with the x^5 S-box, 8 full and
//! 57 partial rounds. Round constants and the MDS matrix come from the
//! Grain LFSR procedure, so native and in-circuit hashing agree for any
//! prime field the circuits are instantiated over.

use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar,
    poseidon::{constraints::PoseidonSpongeVar, find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    Absorb, CryptographicSponge,
};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Number of full rounds (beginning + end)
pub const FULL_ROUNDS: usize = 8;

/// Number of partial rounds
pub const PARTIAL_ROUNDS: usize = 57;

/// S-box exponent
pub const ALPHA: u64 = 5;

pub const RATE: usize = 2;
pub const CAPACITY: usize = 1;

/// Build the sponge parameters for `F`.
pub fn poseidon_config<F: PrimeField>() -> PoseidonConfig<F> {
    let (ark, mds) = find_poseidon_ark_and_mds::<F>(
        F::MODULUS_BIT_SIZE as u64,
        RATE,
        FULL_ROUNDS as u64,
        PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig {
        full_rounds: FULL_ROUNDS,
        partial_rounds: PARTIAL_ROUNDS,
        alpha: ALPHA,
        ark,
        mds,
        rate: RATE,
        capacity: CAPACITY,
    }
}

/// Hashes field elements natively and in-circuit with one parameter set.
///
/// Generating the Grain constants is not free, so hold on to a hasher
/// instead of rebuilding it per hash.
#[derive(Clone, Debug)]
pub struct PoseidonHasher<F: PrimeField> {
    config: PoseidonConfig<F>,
}

impl<F: PrimeField + Absorb> PoseidonHasher<F> {
    pub fn new() -> Self {
        Self {
            config: poseidon_config(),
        }
    }

    pub fn config(&self) -> &PoseidonConfig<F> {
        &self.config
    }

    /// Absorb `inputs` in order and squeeze one element.
    pub fn hash(&self, inputs: &[F]) -> F {
        let mut sponge = PoseidonSponge::new(&self.config);
        for input in inputs {
            sponge.absorb(input);
        }
        sponge.squeeze_field_elements::<F>(1)[0]
    }

    /// In-circuit counterpart of [`PoseidonHasher::hash`].
    pub fn hash_var(
        &self,
        cs: ConstraintSystemRef<F>,
        inputs: &[FpVar<F>],
    ) -> Result<FpVar<F>, SynthesisError> {
        let mut sponge = PoseidonSpongeVar::new(cs, &self.config);
        for input in inputs {
            sponge.absorb(input)?;
        }
        let mut out = sponge.squeeze_field_elements(1)?;
        Ok(out.remove(0))
    }
}

impl<F: PrimeField + Absorb> Default for PoseidonHasher<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget};
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_config_shape() {
        let config = poseidon_config::<Fr>();
        assert_eq!(config.ark.len(), FULL_ROUNDS + PARTIAL_ROUNDS);
        assert!(config.ark.iter().all(|round| round.len() == RATE + CAPACITY));
        assert_eq!(config.mds.len(), RATE + CAPACITY);
    }

    #[test]
    fn test_native_hash_is_deterministic() {
        let hasher = PoseidonHasher::<Fr>::new();
        let a = hasher.hash(&[Fr::from(1u64), Fr::from(2u64)]);
        let b = hasher.hash(&[Fr::from(1u64), Fr::from(2u64)]);
        let c = hasher.hash(&[Fr::from(2u64), Fr::from(1u64)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_gadget_matches_native() {
        let hasher = PoseidonHasher::<Fr>::new();
        let cs = ConstraintSystem::<Fr>::new_ref();

        let inputs = [Fr::from(42u64), Fr::from(123u64), Fr::from(7u64)];
        let vars: Vec<FpVar<Fr>> = inputs
            .iter()
            .map(|x| FpVar::new_witness(cs.clone(), || Ok(*x)).unwrap())
            .collect();

        let result = hasher.hash_var(cs.clone(), &vars).unwrap();
        let expected = FpVar::new_input(cs.clone(), || Ok(hasher.hash(&inputs))).unwrap();
        result.enforce_equal(&expected).unwrap();

        assert!(cs.is_satisfied().unwrap());
    }
}
