//! Proof Generation Service
//!
//! Wraps the Groth16 prover for async callers:
//!
//! - keys are generated lazily, once per [`ProofType`], behind an `RwLock`
//!   (read fast path, write lock re-checked before the expensive setup)
//! - setup and proving run on tokio's blocking pool, so independent
//!   requests prove in parallel without stalling the runtime
//! - a request has no side effects until its proof is submitted, so
//!   dropping the future is a safe cancellation

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ark_bn254::Fr;
use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;
use tokio::sync::RwLock;
use tracing::info;
use zk_lending_arkworks::{
    prove, setup, CircuitKeyPair, PoseidonHasher, ProofRequest, ProofResponse, ProofType, Uint256,
    ZkVerifier,
};

#[derive(Default)]
struct ProvingContext {
    keys: HashMap<ProofType, Arc<CircuitKeyPair>>,
}

#[derive(Clone)]
pub struct ProverService {
    context: Arc<RwLock<ProvingContext>>,
    hasher: Arc<PoseidonHasher<Fr>>,
    seed: Option<u64>,
}

impl ProverService {
    /// With a seed, key generation is reproducible (development only).
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            context: Arc::new(RwLock::new(ProvingContext::default())),
            hasher: Arc::new(PoseidonHasher::new()),
            seed,
        }
    }

    /// Commitment hasher matching the circuits.
    pub fn hasher(&self) -> &PoseidonHasher<Fr> {
        &self.hasher
    }

    /// Key pair for `proof_type`, generated on first use.
    pub async fn keys(&self, proof_type: ProofType) -> Result<Arc<CircuitKeyPair>> {
        {
            let context = self.context.read().await;
            if let Some(keys) = context.keys.get(&proof_type) {
                return Ok(keys.clone());
            }
        }

        let mut context = self.context.write().await;
        if let Some(keys) = context.keys.get(&proof_type) {
            return Ok(keys.clone());
        }

        info!(%proof_type, "Generating circuit keys...");
        let seed = self.seed;
        let keys = tokio::task::spawn_blocking(move || match seed {
            Some(seed) => {
                let offset = ProofType::ALL.iter().position(|t| *t == proof_type).unwrap_or(0) as u64;
                setup(proof_type, &mut StdRng::seed_from_u64(seed.wrapping_add(offset)))
            }
            None => setup(proof_type, &mut OsRng),
        })
        .await
        .context("Key generation task failed")?
        .with_context(|| format!("Failed to generate {proof_type} keys"))?;

        let keys = Arc::new(keys);
        context.keys.insert(proof_type, keys.clone());
        info!(%proof_type, "Circuit keys ready");
        Ok(keys)
    }

    pub async fn generate(&self, request: ProofRequest) -> Result<ProofResponse> {
        let proof_type = request.proof_type();
        let keys = self.keys(proof_type).await?;
        let hasher = self.hasher.clone();

        tokio::task::spawn_blocking(move || prove(&keys, &hasher, &request, &mut OsRng))
            .await
            .context("Proving task failed")?
            .map_err(|e| anyhow!("{proof_type} proof generation failed: {e}"))
    }

    /// EVM word encoding of the verification key.
    pub async fn verification_key(&self, proof_type: ProofType) -> Result<Vec<Uint256>> {
        Ok(self.keys(proof_type).await?.verification_key_words())
    }

    /// Install every verification key into `verifier`.
    pub async fn provision(&self, verifier: &mut ZkVerifier) -> Result<()> {
        for proof_type in ProofType::ALL {
            let words = self.verification_key(proof_type).await?;
            verifier
                .set_verification_key(proof_type, &words)
                .with_context(|| format!("Failed to install {proof_type} verification key"))?;
        }
        Ok(())
    }
}
