//! Error Handling Module
//!
//! Every rejected pool call maps to one of four kinds:
//!
//! | Kind | Variant | Example |
//! |------|---------|---------|
//! | malformed input | [`ProtocolError::Malformed`] | zero commitment, zero price |
//! | proof invalid | [`ProtocolError::ProofInvalid`] | pairing check fails |
//! | state conflict | [`ProtocolError::StateConflict`] | nullifier already spent |
//! | policy violation | [`ProtocolError::Policy`] | borrow beyond liquidity |
//!
//! A failed call leaves no trace in the registry or the pool. Nothing is
//! retried here; the client retries with a fresh proof.

use thiserror::Error;
use zk_lending_arkworks::ProofType;

use crate::registry::RegistryError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // ============ Malformed input ============
    #[error("Malformed input: {0}")]
    Malformed(String),

    // ============ Proof invalid ============
    /// Malformed proofs and failed pairings are not distinguished here;
    /// the reason is logged by the verifier.
    #[error("{0} proof rejected")]
    ProofInvalid(ProofType),

    // ============ State conflict ============
    #[error("State conflict: {0}")]
    StateConflict(#[from] RegistryError),

    // ============ Policy violation ============
    #[error("Policy violation: {0}")]
    Policy(#[from] PolicyViolation),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("no collateral deposited")]
    NoDeposit,

    #[error("collateral already deposited")]
    AlreadyDeposited,

    #[error("position already has an open borrow")]
    AlreadyBorrowing,

    #[error("no open borrow")]
    NoBorrow,

    #[error("outstanding debt must be repaid first")]
    OutstandingDebt,

    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },

    #[error("{0} proof required")]
    MissingProof(ProofType),

    #[error("{field} does not match: expected {expected}, got {got}")]
    ParameterMismatch {
        field: &'static str,
        expected: String,
        got: String,
    },

    #[error("oracle price not set")]
    PriceNotSet,

    #[error("timestamp {got} precedes last update {last}")]
    StaleTimestamp { got: u64, last: u64 },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
