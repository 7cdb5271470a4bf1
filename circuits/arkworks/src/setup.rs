//! Per-circuit Groth16 trusted setup
//!
//! Each statement gets its own key pair. Setup randomness is toxic waste:
//! a seeded RNG is only acceptable for tests and local demos.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use tracing::{debug, info};

use crate::encoding::Uint256;
use crate::error::{CircuitError, CircuitResult};
use crate::verifier::VerificationKey;
use crate::{CollateralCircuit, LTVCircuit, LiquidationCircuit, ProofType};

/// Keys for a single circuit
#[derive(Clone)]
pub struct CircuitKeyPair {
    pub proof_type: ProofType,
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl CircuitKeyPair {
    /// Verification key flattened to words, ready for
    /// [`ZkVerifier::set_verification_key`](crate::verifier::ZkVerifier::set_verification_key).
    pub fn verification_key_words(&self) -> Vec<Uint256> {
        VerificationKey::from(&self.verifying_key).to_words()
    }

    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> CircuitResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> CircuitResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Rebuild a key pair from [`serialize_pk`](Self::serialize_pk) /
    /// [`serialize_vk`](Self::serialize_vk) output.
    pub fn deserialize(proof_type: ProofType, pk: &[u8], vk: &[u8]) -> CircuitResult<Self> {
        let proving_key = ProvingKey::deserialize_compressed(pk)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;
        let verifying_key = VerifyingKey::deserialize_compressed(vk)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;

        if verifying_key.gamma_abc_g1.len() != proof_type.public_input_count() + 1 {
            return Err(CircuitError::Serialization(format!(
                "verifying key has {} IC points, {} needs {}",
                verifying_key.gamma_abc_g1.len(),
                proof_type,
                proof_type.public_input_count() + 1
            )));
        }

        Ok(Self {
            proof_type,
            proving_key,
            verifying_key,
        })
    }
}

/// Run the circuit-specific setup for one statement.
pub fn setup<R: RngCore + CryptoRng>(proof_type: ProofType, rng: &mut R) -> CircuitResult<CircuitKeyPair> {
    info!(%proof_type, "Running Groth16 setup");

    let (proving_key, verifying_key) = match proof_type {
        ProofType::Collateral => {
            Groth16::<Bn254>::circuit_specific_setup(CollateralCircuit::<Fr>::empty(), rng)
        }
        ProofType::Ltv => Groth16::<Bn254>::circuit_specific_setup(LTVCircuit::<Fr>::empty(), rng),
        ProofType::Liquidation => {
            Groth16::<Bn254>::circuit_specific_setup(LiquidationCircuit::<Fr>::empty(), rng)
        }
    }
    .map_err(|e| CircuitError::Setup(e.to_string()))?;

    debug!(
        %proof_type,
        ic_points = verifying_key.gamma_abc_g1.len(),
        "Setup complete"
    );

    Ok(CircuitKeyPair {
        proof_type,
        proving_key,
        verifying_key,
    })
}
