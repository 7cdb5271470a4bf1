//! ZK Private Lending: protocol layer
//!
//! ```text
//!  client ──ProofRequest──▶ ProverService ──ProofResponse──┐
//!                                                         ▼
//!                     ┌──────────── LendingPool ────────────────┐
//!                     │ accrue ▸ policy ▸ ZkVerifier ▸ registry │
//!                     └──────────────────┬──────────────────────┘
//!                                        ▼
//!                    CommitmentRegistry (commitments, nullifiers)
//! ```
//!
//! The registry and verifier are explicit values owned by the caller and
//! lent to the pool; there is no global state.

pub mod config;
pub mod error;
pub mod events;
pub mod interest;
pub mod pool;
pub mod prover;
pub mod registry;
pub mod types;

pub use config::{Config, Environment};
pub use error::{PolicyViolation, ProtocolError, ProtocolResult};
pub use events::LendingEvent;
pub use interest::{BorrowIndex, InterestRateModel};
pub use pool::{
    BorrowRequest, CollateralRemainder, DebtRemainder, LendingPool, PoolConfig, PoolStatus, Position,
    PositionUpdate, RepayRequest, WithdrawRequest,
};
pub use prover::ProverService;
pub use registry::{CommitmentKind, CommitmentRecord, CommitmentRegistry, CommitmentStatus, RegistryError};
pub use types::{Address, Commitment, Nullifier};
