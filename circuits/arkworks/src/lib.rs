//! Private collateral policies over R1CS / Groth16 (BN254)
//!
//! Three statements are proven about hidden amounts, each bound to public
//! Poseidon commitments:
//!
//! | Circuit | Statement | Public inputs |
//! |---------|-----------|---------------|
//! | [`CollateralCircuit`] | collateral >= threshold | threshold, commitment |
//! | [`LTVCircuit`] | debt·100 <= collateral·max_ltv | max_ltv, collateral_commitment, debt_commitment |
//! | [`LiquidationCircuit`] | collateral·price·liq_threshold < debt·100·PRICE_SCALE | price, liq_threshold, position_hash |
//!
//! Around the circuits sit the per-circuit trusted [`setup`], the
//! [`prover`] producing EVM-word-encoded proofs, and a pairing-based
//! [`verifier`] that accepts keys and proofs in the same encoding.

pub mod collateral;
pub mod commitment;
pub mod encoding;
pub mod error;
pub mod gadgets;
pub mod liquidation;
pub mod ltv;
pub mod proof_type;
pub mod prover;
pub mod setup;
pub mod verifier;

pub use collateral::CollateralCircuit;
pub use commitment::{Opening, PositionOpening};
pub use encoding::{ProofData, Uint256};
pub use error::{CircuitError, CircuitResult};
pub use gadgets::PoseidonHasher;
pub use liquidation::LiquidationCircuit;
pub use ltv::LTVCircuit;
pub use proof_type::ProofType;
pub use prover::{prove, ProofRequest, ProofResponse};
pub use setup::{setup, CircuitKeyPair};
pub use verifier::{try_verify, verify, VerificationKey, VerifierError, ZkVerifier};

/// Bit width of amounts and prices
pub const VALUE_BITS: usize = 64;

/// Bit width of percentage ratios (max_ltv, liq_threshold)
pub const RATIO_BITS: usize = 8;

/// Comparison width for two range-checked amounts
pub const VALUE_CMP_BITS: usize = VALUE_BITS + 1;

/// Comparison width for the LTV cross products (< 2^72)
pub const LTV_CMP_BITS: usize = 80;

/// Comparison width for the liquidation cross products (< 2^136)
pub const LIQUIDATION_CMP_BITS: usize = 144;

/// Prices carry 8 decimals
pub const PRICE_SCALE: u64 = 100_000_000;

pub const PERCENT: u64 = 100;
