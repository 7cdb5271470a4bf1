//! Groth16 proof generation
//!
//! A [`ProofRequest`] carries the private openings plus the public
//! parameters of one statement. Requests are validated natively before any
//! proving work so an unprovable statement fails with a reason instead of
//! a bad proof.
//!
//! ```text
//! ProofRequest ──validate──▶ circuit ──Groth16::prove──▶ ProofResponse
//!                                                        { proof (A,B,C), public_inputs }
//! ```

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::Groth16;
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::commitment::{Opening, PositionOpening};
use crate::encoding::{ProofData, Uint256};
use crate::error::{validation, CircuitError, CircuitResult};
use crate::gadgets::PoseidonHasher;
use crate::setup::CircuitKeyPair;
use crate::{CollateralCircuit, LTVCircuit, LiquidationCircuit, ProofType};

/// Private witness plus public parameters for one statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofRequest {
    Collateral {
        collateral: Opening,
        threshold: u64,
    },
    Ltv {
        collateral: Opening,
        debt: Opening,
        max_ltv: u64,
    },
    Liquidation {
        position: PositionOpening,
        price: u64,
        liquidation_threshold: u64,
    },
}

impl ProofRequest {
    pub fn proof_type(&self) -> ProofType {
        match self {
            ProofRequest::Collateral { .. } => ProofType::Collateral,
            ProofRequest::Ltv { .. } => ProofType::Ltv,
            ProofRequest::Liquidation { .. } => ProofType::Liquidation,
        }
    }
}

/// Proof plus the ordered public inputs it was generated against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResponse {
    pub proof_type: ProofType,
    pub proof: ProofData,
    pub public_inputs: Vec<Uint256>,
}

fn check_keys(keys: &CircuitKeyPair, expected: ProofType) -> CircuitResult<()> {
    if keys.proof_type != expected {
        return Err(CircuitError::KeyMismatch {
            expected,
            got: keys.proof_type,
        });
    }
    Ok(())
}

/// Prove any statement with the matching key pair.
pub fn prove<R: RngCore + CryptoRng>(
    keys: &CircuitKeyPair,
    hasher: &PoseidonHasher<Fr>,
    request: &ProofRequest,
    rng: &mut R,
) -> CircuitResult<ProofResponse> {
    match request {
        ProofRequest::Collateral {
            collateral,
            threshold,
        } => prove_collateral(keys, hasher, collateral, *threshold, rng),
        ProofRequest::Ltv {
            collateral,
            debt,
            max_ltv,
        } => prove_ltv(keys, hasher, collateral, debt, *max_ltv, rng),
        ProofRequest::Liquidation {
            position,
            price,
            liquidation_threshold,
        } => prove_liquidation(keys, hasher, position, *price, *liquidation_threshold, rng),
    }
}

/// `collateral >= threshold` against `Poseidon(collateral, salt)`.
pub fn prove_collateral<R: RngCore + CryptoRng>(
    keys: &CircuitKeyPair,
    hasher: &PoseidonHasher<Fr>,
    collateral: &Opening,
    threshold: u64,
    rng: &mut R,
) -> CircuitResult<ProofResponse> {
    check_keys(keys, ProofType::Collateral)?;
    validation::validate_salt(&collateral.salt)?;
    validation::validate_collateral(collateral.value, threshold)?;

    info!(threshold, "Generating collateral proof");
    let start = Instant::now();

    let commitment = collateral.commitment(hasher);
    let circuit = CollateralCircuit::new(
        Fr::from(collateral.value),
        collateral.salt,
        Fr::from(threshold),
        commitment,
    );

    let proof = Groth16::<Bn254>::prove(&keys.proving_key, circuit, rng)
        .map_err(|e| CircuitError::Proving(e.to_string()))?;

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Collateral proof generated");

    Ok(ProofResponse {
        proof_type: ProofType::Collateral,
        proof: ProofData::from(&proof),
        public_inputs: vec![Uint256::from(threshold), Uint256::from_field(commitment)],
    })
}

/// `debt·100 <= collateral·max_ltv` against both amount commitments.
pub fn prove_ltv<R: RngCore + CryptoRng>(
    keys: &CircuitKeyPair,
    hasher: &PoseidonHasher<Fr>,
    collateral: &Opening,
    debt: &Opening,
    max_ltv: u64,
    rng: &mut R,
) -> CircuitResult<ProofResponse> {
    check_keys(keys, ProofType::Ltv)?;
    validation::validate_salt(&collateral.salt)?;
    validation::validate_salt(&debt.salt)?;
    validation::validate_ltv(collateral.value, debt.value, max_ltv)?;

    info!(max_ltv, "Generating LTV proof");
    let start = Instant::now();

    let collateral_commitment = collateral.commitment(hasher);
    let debt_commitment = debt.commitment(hasher);
    let circuit = LTVCircuit::new(
        Fr::from(collateral.value),
        collateral.salt,
        Fr::from(debt.value),
        debt.salt,
        Fr::from(max_ltv),
        collateral_commitment,
        debt_commitment,
    );

    let proof = Groth16::<Bn254>::prove(&keys.proving_key, circuit, rng)
        .map_err(|e| CircuitError::Proving(e.to_string()))?;

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "LTV proof generated");

    Ok(ProofResponse {
        proof_type: ProofType::Ltv,
        proof: ProofData::from(&proof),
        public_inputs: vec![
            Uint256::from(max_ltv),
            Uint256::from_field(collateral_commitment),
            Uint256::from_field(debt_commitment),
        ],
    })
}

/// Health factor below 1.0 at `price` against the position hash.
pub fn prove_liquidation<R: RngCore + CryptoRng>(
    keys: &CircuitKeyPair,
    hasher: &PoseidonHasher<Fr>,
    position: &PositionOpening,
    price: u64,
    liquidation_threshold: u64,
    rng: &mut R,
) -> CircuitResult<ProofResponse> {
    check_keys(keys, ProofType::Liquidation)?;
    validation::validate_salt(&position.salt)?;
    validation::validate_liquidation(position.collateral, position.debt, price, liquidation_threshold)?;

    info!(price, liquidation_threshold, "Generating liquidation proof");
    let start = Instant::now();

    let position_hash = position.hash(hasher);
    let circuit = LiquidationCircuit::new(
        Fr::from(position.collateral),
        Fr::from(position.debt),
        position.salt,
        Fr::from(price),
        Fr::from(liquidation_threshold),
        position_hash,
    );

    let proof = Groth16::<Bn254>::prove(&keys.proving_key, circuit, rng)
        .map_err(|e| CircuitError::Proving(e.to_string()))?;

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Liquidation proof generated");

    Ok(ProofResponse {
        proof_type: ProofType::Liquidation,
        proof: ProofData::from(&proof),
        public_inputs: vec![
            Uint256::from(price),
            Uint256::from(liquidation_threshold),
            Uint256::from_field(position_hash),
        ],
    })
}
