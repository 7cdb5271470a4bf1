//! Commitment / Nullifier Registry
//!
//! Tracks every commitment's lifecycle and every spent nullifier:
//!
//! ```text
//! unregistered ──register──▶ live ──update/nullify──▶ nullified (terminal)
//! ```
//!
//! Each nullifier may be consumed once, ever. A nullified commitment is
//! never revived and never re-registered.
//!
//! The registry is an explicit store owned by the caller and handed to the
//! pool by reference. Mutations are journaled while a checkpoint is open so
//! a failing pool operation can undo whatever it already applied.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::{Address, Commitment, Nullifier};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentKind {
    Collateral,
    Debt,
    Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentStatus {
    Live,
    Nullified,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub owner: Address,
    pub kind: CommitmentKind,
    pub status: CommitmentStatus,
    pub registered_at: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("zero commitment")]
    ZeroCommitment,

    #[error("commitment {0} is already registered")]
    AlreadyRegistered(Commitment),

    #[error("commitment {0} is not live")]
    NotLive(Commitment),

    #[error("nullifier {0} has already been used")]
    NullifierUsed(Nullifier),
}

/// Position in the undo journal returned by [`CommitmentRegistry::checkpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct Checkpoint {
    journal_len: usize,
    depth: usize,
}

#[derive(Debug, Clone)]
enum Undo {
    Registered(Commitment),
    Nullified(Commitment),
    NullifierSpent(Nullifier),
}

#[derive(Debug, Default)]
pub struct CommitmentRegistry {
    records: HashMap<Commitment, CommitmentRecord>,
    by_owner: HashMap<Address, Vec<Commitment>>,
    spent: HashSet<Nullifier>,
    journal: Vec<Undo>,
    open_checkpoints: usize,
}

impl CommitmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// `true` iff the commitment is registered and not nullified.
    pub fn is_valid(&self, commitment: &Commitment) -> bool {
        self.records
            .get(commitment)
            .map(|r| r.status == CommitmentStatus::Live)
            .unwrap_or(false)
    }

    pub fn is_nullifier_used(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(nullifier)
    }

    pub fn record(&self, commitment: &Commitment) -> Option<&CommitmentRecord> {
        self.records.get(commitment)
    }

    /// Live commitments of `owner`, oldest first.
    pub fn get_user_commitments(&self, owner: &Address) -> Vec<Commitment> {
        self.by_owner
            .get(owner)
            .map(|list| list.iter().filter(|c| self.is_valid(c)).copied().collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// `unregistered → live`
    pub fn register(
        &mut self,
        commitment: Commitment,
        kind: CommitmentKind,
        owner: Address,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        self.check_registrable(&commitment)?;
        self.insert(commitment, kind, owner, timestamp);
        debug!(%commitment, ?kind, %owner, "Commitment registered");
        Ok(())
    }

    /// `live → nullified`, consuming `nullifier`.
    pub fn nullify(&mut self, commitment: Commitment, nullifier: Nullifier) -> Result<(), RegistryError> {
        self.check_live(&commitment)?;
        self.check_unspent(&nullifier)?;

        self.spend(nullifier);
        self.retire(commitment);
        debug!(%commitment, %nullifier, "Commitment nullified");
        Ok(())
    }

    /// Atomically replace `old` with `new`: `old` is nullified, `new` is
    /// registered with the same kind and owner, and `nullifier` is consumed.
    /// Nothing changes unless all three succeed.
    pub fn update(
        &mut self,
        old: Commitment,
        new: Commitment,
        nullifier: Nullifier,
        timestamp: u64,
    ) -> Result<(), RegistryError> {
        let (kind, owner) = {
            let record = self.check_live(&old)?;
            (record.kind, record.owner)
        };
        self.check_unspent(&nullifier)?;
        self.check_registrable(&new)?;

        self.spend(nullifier);
        self.retire(old);
        self.insert(new, kind, owner, timestamp);
        debug!(%old, %new, %nullifier, "Commitment updated");
        Ok(())
    }

    // ========================================================================
    // Journal
    // ========================================================================

    /// Start recording undo entries.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.open_checkpoints += 1;
        Checkpoint {
            journal_len: self.journal.len(),
            depth: self.open_checkpoints,
        }
    }

    /// Undo every mutation made since `checkpoint`.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal_len {
            match self.journal.pop() {
                Some(Undo::Registered(c)) => {
                    if let Some(record) = self.records.remove(&c) {
                        if let Some(list) = self.by_owner.get_mut(&record.owner) {
                            if let Some(pos) = list.iter().rposition(|x| *x == c) {
                                list.remove(pos);
                            }
                        }
                    }
                }
                Some(Undo::Nullified(c)) => {
                    if let Some(record) = self.records.get_mut(&c) {
                        record.status = CommitmentStatus::Live;
                    }
                }
                Some(Undo::NullifierSpent(n)) => {
                    self.spent.remove(&n);
                }
                None => break,
            }
        }
        self.close(checkpoint);
        debug!(depth = checkpoint.depth, "Registry reverted");
    }

    /// Keep every mutation made since `checkpoint`.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        self.close(checkpoint);
    }

    fn close(&mut self, checkpoint: Checkpoint) {
        debug_assert_eq!(checkpoint.depth, self.open_checkpoints, "checkpoints must close in LIFO order");
        self.open_checkpoints = checkpoint.depth.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_registrable(&self, commitment: &Commitment) -> Result<(), RegistryError> {
        if commitment.is_zero() {
            return Err(RegistryError::ZeroCommitment);
        }
        if self.records.contains_key(commitment) {
            return Err(RegistryError::AlreadyRegistered(*commitment));
        }
        Ok(())
    }

    fn check_live(&self, commitment: &Commitment) -> Result<&CommitmentRecord, RegistryError> {
        match self.records.get(commitment) {
            Some(record) if record.status == CommitmentStatus::Live => Ok(record),
            _ => Err(RegistryError::NotLive(*commitment)),
        }
    }

    fn check_unspent(&self, nullifier: &Nullifier) -> Result<(), RegistryError> {
        if self.spent.contains(nullifier) {
            return Err(RegistryError::NullifierUsed(*nullifier));
        }
        Ok(())
    }

    fn journal(&mut self, entry: Undo) {
        if self.open_checkpoints > 0 {
            self.journal.push(entry);
        }
    }

    fn insert(&mut self, commitment: Commitment, kind: CommitmentKind, owner: Address, timestamp: u64) {
        self.records.insert(
            commitment,
            CommitmentRecord {
                owner,
                kind,
                status: CommitmentStatus::Live,
                registered_at: timestamp,
            },
        );
        self.by_owner.entry(owner).or_default().push(commitment);
        self.journal(Undo::Registered(commitment));
    }

    fn retire(&mut self, commitment: Commitment) {
        if let Some(record) = self.records.get_mut(&commitment) {
            record.status = CommitmentStatus::Nullified;
        }
        self.journal(Undo::Nullified(commitment));
    }

    fn spend(&mut self, nullifier: Nullifier) {
        self.spent.insert(nullifier);
        self.journal(Undo::NullifierSpent(nullifier));
    }
}
