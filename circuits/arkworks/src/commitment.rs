//! Hiding commitments
//!
//! ```text
//! commitment    = Poseidon(value, salt)
//! position_hash = Poseidon(collateral, debt, salt)
//! ```
//!
//! The salt is a uniformly random field element kept by the owner; the
//! opening (value, salt) never leaves the prover.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::Absorb;
use ark_ff::{PrimeField, UniformRand};
use ark_std::rand::Rng;

use crate::gadgets::PoseidonHasher;

/// Commit to a single amount.
pub fn commit<F: PrimeField + Absorb>(hasher: &PoseidonHasher<F>, value: F, salt: F) -> F {
    hasher.hash(&[value, salt])
}

/// Commit to a (collateral, debt) pair.
pub fn commit_position<F: PrimeField + Absorb>(
    hasher: &PoseidonHasher<F>,
    collateral: F,
    debt: F,
    salt: F,
) -> F {
    hasher.hash(&[collateral, debt, salt])
}

/// Secret opening of an amount commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opening {
    pub value: u64,
    pub salt: Fr,
}

impl Opening {
    pub fn new(value: u64, salt: Fr) -> Self {
        Self { value, salt }
    }

    /// Fresh opening with a random salt.
    pub fn random<R: Rng + ?Sized>(value: u64, rng: &mut R) -> Self {
        Self {
            value,
            salt: Fr::rand(rng),
        }
    }

    pub fn commitment(&self, hasher: &PoseidonHasher<Fr>) -> Fr {
        commit(hasher, Fr::from(self.value), self.salt)
    }
}

/// Secret opening of a position hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionOpening {
    pub collateral: u64,
    pub debt: u64,
    pub salt: Fr,
}

impl PositionOpening {
    pub fn new(collateral: u64, debt: u64, salt: Fr) -> Self {
        Self {
            collateral,
            debt,
            salt,
        }
    }

    pub fn random<R: Rng + ?Sized>(collateral: u64, debt: u64, rng: &mut R) -> Self {
        Self::new(collateral, debt, Fr::rand(rng))
    }

    pub fn hash(&self, hasher: &PoseidonHasher<Fr>) -> Fr {
        commit_position(
            hasher,
            Fr::from(self.collateral),
            Fr::from(self.debt),
            self.salt,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_commitment_binds_value_and_salt() {
        let hasher = PoseidonHasher::<Fr>::new();
        let salt = Fr::from(12345u64);
        let c = commit(&hasher, Fr::from(1000u64), salt);
        assert_ne!(c, commit(&hasher, Fr::from(1001u64), salt));
        assert_ne!(c, commit(&hasher, Fr::from(1000u64), salt + Fr::from(1u64)));
    }

    #[test]
    fn test_random_openings_hide_equal_amounts() {
        let hasher = PoseidonHasher::<Fr>::new();
        let mut rng = StdRng::seed_from_u64(42);
        let a = Opening::random(500, &mut rng);
        let b = Opening::random(500, &mut rng);
        assert_ne!(a.commitment(&hasher), b.commitment(&hasher));
    }

    #[test]
    fn test_position_hash_is_ordered() {
        let hasher = PoseidonHasher::<Fr>::new();
        let salt = Fr::from(9u64);
        let p = PositionOpening::new(100, 80, salt);
        let swapped = PositionOpening::new(80, 100, salt);
        assert_ne!(p.hash(&hasher), swapped.hash(&hasher));
    }
}
