//! Groth16 verifier over BN254
//!
//! Checks
//! ```text
//! e(-A, B) · e(α, β) · e(L, γ) · e(C, δ) == 1
//! L = IC[0] + Σ xᵢ · IC[i+1]
//! ```
//! against a verification key supplied as 256-bit words, the same way an
//! on-chain precompile-based verifier does.
//!
//! Rejection order: public-input count, scalar canonicity, proof point
//! decoding, then the pairing product. Every failure collapses to `false`
//! in [`verify`]; [`try_verify`] keeps the reason for logging.

use std::collections::HashMap;

use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Affine};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{One, PrimeField};
use thiserror::Error;
use tracing::{debug, warn};

use crate::encoding::{g1_from_words, g1_to_words, g2_from_words, g2_to_words, EncodingError, ProofData, Uint256};
use crate::ProofType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("expected {expected} public inputs, got {got}")]
    PublicInputCount { expected: usize, got: usize },

    #[error("public input {index} is not a canonical scalar")]
    NonCanonicalInput { index: usize },

    #[error("malformed proof: {0}")]
    MalformedProof(EncodingError),

    #[error("malformed verification key: {0}")]
    MalformedKey(EncodingError),

    #[error("verification key for {proof_type} must be {expected} words, got {got}")]
    KeyLength {
        proof_type: ProofType,
        expected: usize,
        got: usize,
    },

    #[error("verification key for {0} is already set")]
    KeyAlreadySet(ProofType),

    #[error("no verification key registered for {0}")]
    UnknownKey(ProofType),

    #[error("pairing check failed")]
    PairingCheckFailed,
}

/// Verification key in decoded form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationKey {
    pub alpha: G1Affine,
    pub beta: G2Affine,
    pub gamma: G2Affine,
    pub delta: G2Affine,
    pub ic: Vec<G1Affine>,
}

impl VerificationKey {
    pub fn num_public_inputs(&self) -> usize {
        self.ic.len().saturating_sub(1)
    }

    /// Decode `[α(2), β(4), γ(4), δ(4), IC₀(2), IC₁(2), …]`.
    pub fn from_words(words: &[Uint256]) -> Result<Self, EncodingError> {
        if words.len() < 16 || words.len() % 2 != 0 {
            return Err(EncodingError::KeyLength(words.len()));
        }
        let g2_at = |i: usize| [words[i], words[i + 1], words[i + 2], words[i + 3]];

        let alpha = g1_from_words(words[0], words[1], "alpha")?;
        let beta = g2_from_words(g2_at(2), "beta")?;
        let gamma = g2_from_words(g2_at(6), "gamma")?;
        let delta = g2_from_words(g2_at(10), "delta")?;
        let ic = words[14..]
            .chunks_exact(2)
            .map(|xy| g1_from_words(xy[0], xy[1], "IC"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            alpha,
            beta,
            gamma,
            delta,
            ic,
        })
    }

    pub fn to_words(&self) -> Vec<Uint256> {
        let mut words = Vec::with_capacity(14 + 2 * self.ic.len());
        words.extend(g1_to_words(&self.alpha));
        words.extend(g2_to_words(&self.beta));
        words.extend(g2_to_words(&self.gamma));
        words.extend(g2_to_words(&self.delta));
        for point in &self.ic {
            words.extend(g1_to_words(point));
        }
        words
    }
}

impl From<&ark_groth16::VerifyingKey<Bn254>> for VerificationKey {
    fn from(vk: &ark_groth16::VerifyingKey<Bn254>) -> Self {
        Self {
            alpha: vk.alpha_g1,
            beta: vk.beta_g2,
            gamma: vk.gamma_g2,
            delta: vk.delta_g2,
            ic: vk.gamma_abc_g1.clone(),
        }
    }
}

/// Verify, keeping the rejection reason.
pub fn try_verify(
    proof: &ProofData,
    vk: &VerificationKey,
    public_inputs: &[Uint256],
) -> Result<(), VerifierError> {
    // 1. shape, before touching any curve arithmetic
    if public_inputs.len() != vk.num_public_inputs() || vk.ic.is_empty() {
        return Err(VerifierError::PublicInputCount {
            expected: vk.num_public_inputs(),
            got: public_inputs.len(),
        });
    }

    // 2. scalars must be below the group order
    let scalars = public_inputs
        .iter()
        .enumerate()
        .map(|(index, word)| {
            word.to_field::<Fr>()
                .map_err(|_| VerifierError::NonCanonicalInput { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // 3. proof points
    let proof = proof.to_proof().map_err(VerifierError::MalformedProof)?;

    // 4. L = IC[0] + Σ xᵢ · IC[i+1]
    let mut acc: G1Projective = vk.ic[0].into_group();
    for (scalar, base) in scalars.iter().zip(&vk.ic[1..]) {
        acc += base.mul_bigint(scalar.into_bigint());
    }
    let l = acc.into_affine();

    // 5. e(-A, B) · e(α, β) · e(L, γ) · e(C, δ) == 1
    let product = Bn254::multi_pairing(
        [-proof.a, vk.alpha, l, proof.c],
        [proof.b, vk.beta, vk.gamma, vk.delta],
    );
    if product.0.is_one() {
        Ok(())
    } else {
        Err(VerifierError::PairingCheckFailed)
    }
}

/// Boolean verification: `true` only for a valid proof of the statement.
pub fn verify(proof: &ProofData, vk: &VerificationKey, public_inputs: &[Uint256]) -> bool {
    match try_verify(proof, vk, public_inputs) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Proof rejected");
            false
        }
    }
}

/// Holds one verification key per statement.
///
/// Keys are set once; a second assignment is rejected so a deployed key
/// cannot be swapped under live commitments.
#[derive(Clone, Debug, Default)]
pub struct ZkVerifier {
    keys: HashMap<ProofType, VerificationKey>,
}

impl ZkVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_verification_key(
        &mut self,
        proof_type: ProofType,
        key_material: &[Uint256],
    ) -> Result<(), VerifierError> {
        if self.keys.contains_key(&proof_type) {
            return Err(VerifierError::KeyAlreadySet(proof_type));
        }
        if key_material.len() != proof_type.key_length() {
            return Err(VerifierError::KeyLength {
                proof_type,
                expected: proof_type.key_length(),
                got: key_material.len(),
            });
        }

        let key = VerificationKey::from_words(key_material).map_err(VerifierError::MalformedKey)?;
        self.keys.insert(proof_type, key);
        debug!(%proof_type, "Verification key installed");
        Ok(())
    }

    pub fn has_key(&self, proof_type: ProofType) -> bool {
        self.keys.contains_key(&proof_type)
    }

    pub fn key(&self, proof_type: ProofType) -> Option<&VerificationKey> {
        self.keys.get(&proof_type)
    }

    pub fn try_verify(
        &self,
        proof_type: ProofType,
        proof: &ProofData,
        public_inputs: &[Uint256],
    ) -> Result<(), VerifierError> {
        let key = self
            .keys
            .get(&proof_type)
            .ok_or(VerifierError::UnknownKey(proof_type))?;
        try_verify(proof, key, public_inputs)
    }

    pub fn verify(&self, proof_type: ProofType, proof: &ProofData, public_inputs: &[Uint256]) -> bool {
        match self.try_verify(proof_type, proof, public_inputs) {
            Ok(()) => true,
            Err(e) => {
                warn!(%proof_type, error = %e, "Proof rejected");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::Opening;
    use crate::gadgets::PoseidonHasher;
    use crate::prover::prove_collateral;
    use crate::setup::{setup, CircuitKeyPair};
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    struct Fixture {
        keys: CircuitKeyPair,
        vk: VerificationKey,
        proof: ProofData,
        inputs: Vec<Uint256>,
    }

    fn fixture() -> Fixture {
        let mut rng = StdRng::seed_from_u64(42);
        let hasher = PoseidonHasher::new();
        let keys = setup(ProofType::Collateral, &mut rng).unwrap();
        let opening = Opening::new(1000, Fr::from(12345u64));
        let response = prove_collateral(&keys, &hasher, &opening, 500, &mut rng).unwrap();
        let vk = VerificationKey::from_words(&keys.verification_key_words()).unwrap();

        Fixture {
            keys,
            vk,
            proof: response.proof,
            inputs: response.public_inputs,
        }
    }

    #[test]
    fn test_valid_proof_accepted() {
        let f = fixture();
        assert_eq!(try_verify(&f.proof, &f.vk, &f.inputs), Ok(()));
        assert!(verify(&f.proof, &f.vk, &f.inputs));
    }

    #[test]
    fn test_key_words_roundtrip() {
        let f = fixture();
        assert_eq!(f.vk, VerificationKey::from(&f.keys.verifying_key));
        assert_eq!(f.vk.to_words(), f.keys.verification_key_words());
    }

    #[test]
    fn test_wrong_input_count_rejected() {
        let f = fixture();
        assert_eq!(
            try_verify(&f.proof, &f.vk, &f.inputs[..1]),
            Err(VerifierError::PublicInputCount { expected: 2, got: 1 })
        );
        let mut extra = f.inputs.clone();
        extra.push(Uint256::from(1u64));
        assert!(!verify(&f.proof, &f.vk, &extra));
    }

    #[test]
    fn test_modulus_input_rejected() {
        let f = fixture();
        let mut inputs = f.inputs.clone();
        inputs[0] = Uint256::from_bigint(Fr::MODULUS);
        assert_eq!(
            try_verify(&f.proof, &f.vk, &inputs),
            Err(VerifierError::NonCanonicalInput { index: 0 })
        );
    }

    #[test]
    fn test_tampered_public_input_fails_pairing() {
        let f = fixture();
        let mut inputs = f.inputs.clone();
        // prove against a higher threshold than the one used
        inputs[0] = Uint256::from(501u64);
        assert_eq!(
            try_verify(&f.proof, &f.vk, &inputs),
            Err(VerifierError::PairingCheckFailed)
        );
    }

    #[test]
    fn test_tampered_proof_rejected() {
        let f = fixture();
        let mut proof = f.proof;
        std::mem::swap(&mut proof.a, &mut proof.c);
        assert_eq!(
            try_verify(&proof, &f.vk, &f.inputs),
            Err(VerifierError::PairingCheckFailed)
        );

        let mut proof = f.proof;
        proof.a = [Uint256::from(1u64), Uint256::from(1u64)];
        assert!(matches!(
            try_verify(&proof, &f.vk, &f.inputs),
            Err(VerifierError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_zk_verifier_key_lifecycle() {
        let f = fixture();
        let words = f.keys.verification_key_words();
        let mut verifier = ZkVerifier::new();

        assert!(!verifier.verify(ProofType::Collateral, &f.proof, &f.inputs));
        assert_eq!(
            verifier.set_verification_key(ProofType::Ltv, &words),
            Err(VerifierError::KeyLength {
                proof_type: ProofType::Ltv,
                expected: 22,
                got: 20
            })
        );

        verifier.set_verification_key(ProofType::Collateral, &words).unwrap();
        assert!(verifier.has_key(ProofType::Collateral));
        assert!(verifier.verify(ProofType::Collateral, &f.proof, &f.inputs));

        assert_eq!(
            verifier.set_verification_key(ProofType::Collateral, &words),
            Err(VerifierError::KeyAlreadySet(ProofType::Collateral))
        );
    }
}
