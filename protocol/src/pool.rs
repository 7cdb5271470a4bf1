//! Lending Pool
//!
//! Policy state machine over private positions:
//!
//! ```text
//!            deposit            borrow
//!   empty ───────────▶ deposited ─────────▶ deposited + borrowed
//!     ▲                  │  ▲                   │        │
//!     │     withdraw     │  │   repay (full)    │        │ liquidate
//!     └──────────────────┘  └───────────────────┘        │ (any caller)
//!     ▲                                                  │
//!     └──────────────────────────────────────────────────┘
//! ```
//!
//! Amounts of collateral are never seen by the pool. It only sees
//! commitments and proofs about them; the borrowed principal is the one
//! visible amount because it leaves the pool as liquidity. Debt
//! commitments are therefore opened to the pool: it recomputes
//! `Poseidon(amount, salt)` before accepting an LTV proof over them.
//!
//! Every call runs in the same order:
//!
//! 1. compute the interest accrual for `timestamp` (not yet applied)
//! 2. policy checks and malformed-input checks
//! 3. proof verification against public inputs assembled by the pool
//! 4. registry transitions under a checkpoint, reverted on any failure
//! 5. apply accrual, position and totals, then append events
//!
//! Steps 1-4 mutate nothing that survives a failure, so a rejected call
//! leaves the pool, the registry and the event log exactly as they were.

use std::collections::HashMap;

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zk_lending_arkworks::{Opening, PoseidonHasher, ProofResponse, ProofType, Uint256, ZkVerifier};

use crate::error::{PolicyViolation, ProtocolError, ProtocolResult};
use crate::events::LendingEvent;
use crate::interest::{scale, BorrowIndex, InterestRateModel};
use crate::registry::{CommitmentKind, CommitmentRegistry, RegistryError};
use crate::types::{Address, Commitment, Nullifier};

/// Derivation domains for operations that retire several commitments with
/// one caller nullifier.
const DEBT_DOMAIN: &str = "debt";
const POSITION_DOMAIN: &str = "position";
const COLLATERAL_DOMAIN: &str = "collateral";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Percent, public input of every LTV proof
    pub max_ltv: u64,
    /// Percent, public input of every liquidation proof
    pub liquidation_threshold: u64,
    /// Threshold of deposit collateral proofs
    pub min_collateral: u64,
    pub initial_liquidity: u128,
    /// Oracle price with 8 decimals; zero means unset
    pub initial_price: u64,
    pub interest: InterestRateModel,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_ltv: 75,
            liquidation_threshold: 85,
            min_collateral: 1,
            initial_liquidity: 1_000_000,
            initial_price: 2_000 * zk_lending_arkworks::PRICE_SCALE,
            interest: InterestRateModel::default(),
        }
    }
}

/// Per-user record. The amounts behind the commitments stay private.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub has_deposit: bool,
    pub has_borrow: bool,
    pub collateral_commitment: Option<Commitment>,
    pub debt_commitment: Option<Commitment>,
    pub position_hash: Option<Commitment>,
    /// Visible principal as of `debt_index`
    pub borrowed_amount: u128,
    pub debt_index: u128,
    pub deposited_at: u64,
    pub last_updated_at: u64,
}

impl Position {
    pub fn debt_at(&self, index: u128) -> u128 {
        if !self.has_borrow {
            return 0;
        }
        scale(self.borrowed_amount, self.debt_index, index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BorrowRequest {
    pub amount: u128,
    /// Must equal `Poseidon(amount, debt_salt)`
    pub debt_commitment: Commitment,
    pub debt_salt: Fr,
    /// Not tied to the collateral or debt openings. A hash of a fabricated
    /// healthy position can never be liquidated.
    pub position_hash: Commitment,
    /// LTV proof over the live collateral commitment and `debt_commitment`
    pub ltv_proof: ProofResponse,
}

/// New debt commitment for the part of the debt that stays open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebtRemainder {
    /// Must equal `Poseidon(remaining debt, debt_salt)`
    pub debt_commitment: Commitment,
    pub debt_salt: Fr,
    pub position_hash: Commitment,
    pub ltv_proof: ProofResponse,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepayRequest {
    pub amount: u128,
    pub nullifier: Nullifier,
    /// Required unless `amount` covers the whole debt
    pub remainder: Option<DebtRemainder>,
}

/// Re-proof of an open borrow against a new collateral commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionUpdate {
    pub position_hash: Commitment,
    pub ltv_proof: ProofResponse,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollateralRemainder {
    pub collateral_commitment: Commitment,
    /// Required while a borrow is open
    pub position: Option<PositionUpdate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawRequest {
    pub nullifier: Nullifier,
    /// Collateral proof: over the live commitment when closing, over the
    /// remainder's commitment (at `min_collateral`) otherwise
    pub collateral_proof: ProofResponse,
    pub remainder: Option<CollateralRemainder>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub available_liquidity: u128,
    pub total_borrowed: u128,
    pub utilization_bps: u64,
    pub borrow_rate_bps: u64,
    pub borrow_index: u128,
    pub price: u64,
    pub open_positions: usize,
    pub events: usize,
}

/// Interest to apply on success.
#[derive(Clone, Copy, Debug)]
struct Accrual {
    index: BorrowIndex,
    rate_bps: u64,
    interest: u128,
}

pub struct LendingPool<'a> {
    registry: &'a mut CommitmentRegistry,
    verifier: &'a ZkVerifier,
    hasher: PoseidonHasher<Fr>,
    config: PoolConfig,
    positions: HashMap<Address, Position>,
    available_liquidity: u128,
    total_borrowed: u128,
    index: BorrowIndex,
    price: u64,
    events: Vec<LendingEvent>,
}

impl<'a> LendingPool<'a> {
    pub fn new(
        registry: &'a mut CommitmentRegistry,
        verifier: &'a ZkVerifier,
        config: PoolConfig,
        genesis: u64,
    ) -> Self {
        info!(
            max_ltv = config.max_ltv,
            liquidation_threshold = config.liquidation_threshold,
            liquidity = %config.initial_liquidity,
            "Lending pool created"
        );
        Self {
            registry,
            verifier,
            hasher: PoseidonHasher::new(),
            config,
            positions: HashMap::new(),
            available_liquidity: config.initial_liquidity,
            total_borrowed: 0,
            index: BorrowIndex::new(genesis),
            price: config.initial_price,
            events: Vec::new(),
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommitmentRegistry {
        &*self.registry
    }

    pub fn position(&self, user: &Address) -> Option<&Position> {
        self.positions.get(user)
    }

    /// Debt of `user` including interest up to `now`.
    pub fn current_debt(&self, user: &Address, now: u64) -> u128 {
        let index = match self.accrual(now) {
            Ok(accrual) => accrual.index.value,
            Err(_) => self.index.value,
        };
        self.positions
            .get(user)
            .map(|p| p.debt_at(index))
            .unwrap_or(0)
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn events(&self) -> &[LendingEvent] {
        &self.events
    }

    pub fn status(&self) -> PoolStatus {
        let utilization_bps = InterestRateModel::utilization_bps(self.total_borrowed, self.available_liquidity);
        PoolStatus {
            available_liquidity: self.available_liquidity,
            total_borrowed: self.total_borrowed,
            utilization_bps,
            borrow_rate_bps: self.config.interest.borrow_rate_bps(utilization_bps),
            borrow_index: self.index.value,
            price: self.price,
            open_positions: self.positions.len(),
            events: self.events.len(),
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Bring the borrow index up to `timestamp`.
    pub fn accrue(&mut self, timestamp: u64) -> ProtocolResult<()> {
        let accrual = self.accrual(timestamp)?;
        self.apply_accrual(accrual);
        Ok(())
    }

    pub fn update_price(&mut self, price: u64, timestamp: u64) -> ProtocolResult<()> {
        let accrual = self.accrual(timestamp)?;
        if price == 0 {
            return Err(ProtocolError::Malformed("price must be non-zero".into()));
        }

        self.apply_accrual(accrual);
        self.price = price;
        info!(price, "Price updated");
        self.events.push(LendingEvent::PriceUpdated { price, timestamp });
        Ok(())
    }

    /// Open a position with a collateral commitment proven to hold at least
    /// `min_collateral`.
    pub fn deposit(
        &mut self,
        user: Address,
        commitment: Commitment,
        proof: &ProofResponse,
        timestamp: u64,
    ) -> ProtocolResult<()> {
        let accrual = self.accrual(timestamp)?;
        if self.positions.get(&user).map(|p| p.has_deposit).unwrap_or(false) {
            return Err(PolicyViolation::AlreadyDeposited.into());
        }
        non_zero(&commitment, "collateral commitment")?;

        self.check_proof(
            proof,
            ProofType::Collateral,
            &[
                ("threshold", Some(Uint256::from(self.config.min_collateral))),
                ("commitment", Some(commitment.word())),
            ],
        )?;

        self.transact(|registry| registry.register(commitment, CommitmentKind::Collateral, user, timestamp))?;

        self.apply_accrual(accrual);
        self.positions.insert(
            user,
            Position {
                has_deposit: true,
                collateral_commitment: Some(commitment),
                deposited_at: timestamp,
                last_updated_at: timestamp,
                ..Position::default()
            },
        );
        info!(%user, %commitment, "Collateral deposited");
        self.events.push(LendingEvent::Deposited {
            user,
            commitment,
            timestamp,
        });
        Ok(())
    }

    pub fn borrow(&mut self, user: Address, request: &BorrowRequest, timestamp: u64) -> ProtocolResult<()> {
        let accrual = self.accrual(timestamp)?;
        if request.amount == 0 {
            return Err(PolicyViolation::ZeroAmount.into());
        }
        let position = self.deposited(&user)?;
        if position.has_borrow {
            return Err(PolicyViolation::AlreadyBorrowing.into());
        }
        let collateral_commitment = live_collateral(position)?;
        if request.amount > self.available_liquidity {
            return Err(PolicyViolation::InsufficientLiquidity {
                requested: request.amount,
                available: self.available_liquidity,
            }
            .into());
        }
        non_zero(&request.debt_commitment, "debt commitment")?;
        non_zero(&request.position_hash, "position hash")?;
        self.check_debt_opening(request.amount, &request.debt_salt, request.debt_commitment)?;

        self.check_ltv_proof(&request.ltv_proof, collateral_commitment, request.debt_commitment)?;

        let (debt, hash) = (request.debt_commitment, request.position_hash);
        self.transact(|registry| {
            registry.register(debt, CommitmentKind::Debt, user, timestamp)?;
            registry.register(hash, CommitmentKind::Position, user, timestamp)
        })?;

        self.apply_accrual(accrual);
        self.available_liquidity -= request.amount;
        self.total_borrowed += request.amount;
        if let Some(position) = self.positions.get_mut(&user) {
            position.has_borrow = true;
            position.debt_commitment = Some(debt);
            position.position_hash = Some(hash);
            position.borrowed_amount = request.amount;
            position.debt_index = accrual.index.value;
            position.last_updated_at = timestamp;
        }
        info!(%user, amount = %request.amount, "Borrowed");
        self.events.push(LendingEvent::Borrowed {
            user,
            amount: request.amount,
            debt_commitment: debt,
            position_hash: hash,
            timestamp,
        });
        Ok(())
    }

    /// Repay part or all of the debt. An amount above the debt closes the
    /// borrow and only the debt is taken.
    pub fn repay(&mut self, user: Address, request: &RepayRequest, timestamp: u64) -> ProtocolResult<u128> {
        let accrual = self.accrual(timestamp)?;
        if request.amount == 0 {
            return Err(PolicyViolation::ZeroAmount.into());
        }
        let position = self.borrowing(&user)?;
        let (collateral, debt_commitment, position_hash) = open_commitments(position)?;
        non_zero_nullifier(&request.nullifier)?;

        let debt = position.debt_at(accrual.index.value);
        let nullifier = request.nullifier;

        let (paid, remaining, next) = if request.amount >= debt {
            self.transact(|registry| {
                registry.nullify(debt_commitment, nullifier)?;
                registry.nullify(position_hash, nullifier.derive(POSITION_DOMAIN))
            })?;
            (debt, 0, None)
        } else {
            let remainder = request
                .remainder
                .as_ref()
                .ok_or(PolicyViolation::MissingProof(ProofType::Ltv))?;
            non_zero(&remainder.debt_commitment, "debt commitment")?;
            non_zero(&remainder.position_hash, "position hash")?;
            self.check_debt_opening(debt - request.amount, &remainder.debt_salt, remainder.debt_commitment)?;
            self.check_ltv_proof(&remainder.ltv_proof, collateral, remainder.debt_commitment)?;

            let (new_debt, new_hash) = (remainder.debt_commitment, remainder.position_hash);
            self.transact(|registry| {
                registry.update(debt_commitment, new_debt, nullifier, timestamp)?;
                registry.update(position_hash, new_hash, nullifier.derive(POSITION_DOMAIN), timestamp)
            })?;
            (request.amount, debt - request.amount, Some((new_debt, new_hash)))
        };

        self.apply_accrual(accrual);
        self.available_liquidity += paid;
        self.total_borrowed = self.total_borrowed.saturating_sub(paid);
        if let Some(position) = self.positions.get_mut(&user) {
            match next {
                Some((new_debt, new_hash)) => {
                    position.debt_commitment = Some(new_debt);
                    position.position_hash = Some(new_hash);
                    position.borrowed_amount = remaining;
                    position.debt_index = accrual.index.value;
                }
                None => close_borrow(position),
            }
            position.last_updated_at = timestamp;
        }
        info!(%user, paid = %paid, remaining = %remaining, "Repaid");
        self.events.push(LendingEvent::Repaid {
            user,
            amount: paid,
            remaining_debt: remaining,
            nullifier,
            timestamp,
        });
        Ok(paid)
    }

    pub fn withdraw(&mut self, user: Address, request: &WithdrawRequest, timestamp: u64) -> ProtocolResult<()> {
        let accrual = self.accrual(timestamp)?;
        let position = self.deposited(&user)?;
        let collateral = live_collateral(position)?;
        non_zero_nullifier(&request.nullifier)?;
        let nullifier = request.nullifier;

        let next = match &request.remainder {
            None => {
                if position.has_borrow {
                    return Err(PolicyViolation::OutstandingDebt.into());
                }
                // opening of the live commitment; any threshold will do
                self.check_proof(
                    &request.collateral_proof,
                    ProofType::Collateral,
                    &[("threshold", None), ("commitment", Some(collateral.word()))],
                )?;
                self.transact(|registry| registry.nullify(collateral, nullifier))?;
                None
            }
            Some(remainder) => {
                let new_collateral = remainder.collateral_commitment;
                non_zero(&new_collateral, "collateral commitment")?;
                if !position.has_borrow && remainder.position.is_some() {
                    return Err(ProtocolError::Malformed(
                        "position update supplied without an open borrow".into(),
                    ));
                }
                self.check_proof(
                    &request.collateral_proof,
                    ProofType::Collateral,
                    &[
                        ("threshold", Some(Uint256::from(self.config.min_collateral))),
                        ("commitment", Some(new_collateral.word())),
                    ],
                )?;

                let reproof = if position.has_borrow {
                    let (_, debt_commitment, position_hash) = open_commitments(position)?;
                    let update = remainder
                        .position
                        .as_ref()
                        .ok_or(PolicyViolation::MissingProof(ProofType::Ltv))?;
                    non_zero(&update.position_hash, "position hash")?;
                    self.check_ltv_proof(&update.ltv_proof, new_collateral, debt_commitment)?;
                    Some((position_hash, update.position_hash))
                } else {
                    None
                };

                self.transact(|registry| {
                    registry.update(collateral, new_collateral, nullifier, timestamp)?;
                    if let Some((old_hash, new_hash)) = reproof {
                        registry.update(old_hash, new_hash, nullifier.derive(POSITION_DOMAIN), timestamp)?;
                    }
                    Ok(())
                })?;
                Some((new_collateral, reproof.map(|(_, new_hash)| new_hash)))
            }
        };

        self.apply_accrual(accrual);
        match next {
            Some((commitment, new_hash)) => {
                if let Some(position) = self.positions.get_mut(&user) {
                    position.collateral_commitment = Some(commitment);
                    if new_hash.is_some() {
                        position.position_hash = new_hash;
                    }
                    position.last_updated_at = timestamp;
                }
            }
            None => {
                self.positions.remove(&user);
            }
        }
        let new_commitment = next.map(|(commitment, _)| commitment);
        info!(%user, closed = new_commitment.is_none(), "Collateral withdrawn");
        self.events.push(LendingEvent::Withdrawn {
            user,
            nullifier,
            new_commitment,
            timestamp,
        });
        Ok(())
    }

    /// Close an unhealthy position. The liquidator repays the outstanding
    /// debt and the position's commitments are retired.
    pub fn liquidate(
        &mut self,
        liquidator: Address,
        user: Address,
        nullifier: Nullifier,
        proof: &ProofResponse,
        timestamp: u64,
    ) -> ProtocolResult<u128> {
        let accrual = self.accrual(timestamp)?;
        if self.price == 0 {
            return Err(PolicyViolation::PriceNotSet.into());
        }
        let position = self.borrowing(&user)?;
        let (collateral, debt_commitment, position_hash) = open_commitments(position)?;
        non_zero_nullifier(&nullifier)?;
        let debt = position.debt_at(accrual.index.value);

        self.check_proof(
            proof,
            ProofType::Liquidation,
            &[
                ("price", Some(Uint256::from(self.price))),
                ("liquidation_threshold", Some(Uint256::from(self.config.liquidation_threshold))),
                ("position_hash", Some(position_hash.word())),
            ],
        )?;

        self.transact(|registry| {
            registry.nullify(position_hash, nullifier)?;
            registry.nullify(debt_commitment, nullifier.derive(DEBT_DOMAIN))?;
            registry.nullify(collateral, nullifier.derive(COLLATERAL_DOMAIN))
        })?;

        self.apply_accrual(accrual);
        self.available_liquidity += debt;
        self.total_borrowed = self.total_borrowed.saturating_sub(debt);
        self.positions.remove(&user);
        warn!(%user, %liquidator, debt = %debt, price = self.price, "Position liquidated");
        self.events.push(LendingEvent::Liquidated {
            user,
            liquidator,
            debt,
            price: self.price,
            nullifier,
            timestamp,
        });
        Ok(debt)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn accrual(&self, now: u64) -> ProtocolResult<Accrual> {
        if now < self.index.last_accrued_at {
            return Err(PolicyViolation::StaleTimestamp {
                got: now,
                last: self.index.last_accrued_at,
            }
            .into());
        }

        let utilization = InterestRateModel::utilization_bps(self.total_borrowed, self.available_liquidity);
        let rate_bps = self.config.interest.borrow_rate_bps(utilization);
        let mut index = self.index;
        index.accrue(rate_bps, now);
        let interest = scale(self.total_borrowed, self.index.value, index.value).saturating_sub(self.total_borrowed);

        Ok(Accrual {
            index,
            rate_bps,
            interest,
        })
    }

    fn apply_accrual(&mut self, accrual: Accrual) {
        let advanced = accrual.index.last_accrued_at > self.index.last_accrued_at;
        self.index = accrual.index;
        if !advanced || accrual.interest == 0 {
            return;
        }

        self.total_borrowed += accrual.interest;
        debug!(
            rate_bps = accrual.rate_bps,
            interest = %accrual.interest,
            index = %accrual.index.value,
            "Interest accrued"
        );
        self.events.push(LendingEvent::InterestAccrued {
            rate_bps: accrual.rate_bps,
            interest: accrual.interest,
            index: accrual.index.value,
            timestamp: accrual.index.last_accrued_at,
        });
    }

    /// Run registry transitions all-or-nothing.
    fn transact<F>(&mut self, ops: F) -> ProtocolResult<()>
    where
        F: FnOnce(&mut CommitmentRegistry) -> Result<(), RegistryError>,
    {
        let checkpoint = self.registry.checkpoint();
        match ops(&mut *self.registry) {
            Ok(()) => {
                self.registry.commit(checkpoint);
                Ok(())
            }
            Err(e) => {
                self.registry.revert_to(checkpoint);
                warn!(error = %e, "Registry transition rejected");
                Err(e.into())
            }
        }
    }

    /// Match the submitted public inputs against the expected ones, then
    /// verify against inputs assembled here. `None` accepts any value.
    fn check_proof(
        &self,
        proof: &ProofResponse,
        proof_type: ProofType,
        expected: &[(&'static str, Option<Uint256>)],
    ) -> ProtocolResult<()> {
        if proof.proof_type != proof_type {
            return Err(PolicyViolation::MissingProof(proof_type).into());
        }
        if proof.public_inputs.len() != expected.len() {
            return Err(ProtocolError::Malformed(format!(
                "{proof_type} proof carries {} public inputs, expected {}",
                proof.public_inputs.len(),
                expected.len()
            )));
        }

        let mut inputs = Vec::with_capacity(expected.len());
        for ((field, want), got) in expected.iter().zip(&proof.public_inputs) {
            match want {
                Some(want) if want != got => {
                    return Err(PolicyViolation::ParameterMismatch {
                        field: *field,
                        expected: want.to_string(),
                        got: got.to_string(),
                    }
                    .into());
                }
                Some(want) => inputs.push(*want),
                None => inputs.push(*got),
            }
        }

        if !self.verifier.verify(proof_type, &proof.proof, &inputs) {
            return Err(ProtocolError::ProofInvalid(proof_type));
        }
        Ok(())
    }

    /// The debt amount is public, so its commitment is opened here.
    fn check_debt_opening(&self, amount: u128, salt: &Fr, commitment: Commitment) -> ProtocolResult<()> {
        let value = u64::try_from(amount)
            .map_err(|_| ProtocolError::Malformed(format!("debt {amount} exceeds 64 bits")))?;
        let expected = Commitment::from(Opening::new(value, *salt).commitment(&self.hasher));
        if expected != commitment {
            return Err(PolicyViolation::ParameterMismatch {
                field: "debt_commitment",
                expected: expected.to_string(),
                got: commitment.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn check_ltv_proof(
        &self,
        proof: &ProofResponse,
        collateral: Commitment,
        debt: Commitment,
    ) -> ProtocolResult<()> {
        self.check_proof(
            proof,
            ProofType::Ltv,
            &[
                ("max_ltv", Some(Uint256::from(self.config.max_ltv))),
                ("collateral_commitment", Some(collateral.word())),
                ("debt_commitment", Some(debt.word())),
            ],
        )
    }

    fn deposited(&self, user: &Address) -> ProtocolResult<&Position> {
        match self.positions.get(user) {
            Some(position) if position.has_deposit => Ok(position),
            _ => Err(PolicyViolation::NoDeposit.into()),
        }
    }

    fn borrowing(&self, user: &Address) -> ProtocolResult<&Position> {
        match self.positions.get(user) {
            Some(position) if position.has_borrow => Ok(position),
            _ => Err(PolicyViolation::NoBorrow.into()),
        }
    }
}

fn non_zero(commitment: &Commitment, what: &str) -> ProtocolResult<()> {
    if commitment.is_zero() {
        return Err(ProtocolError::Malformed(format!("zero {what}")));
    }
    Ok(())
}

fn non_zero_nullifier(nullifier: &Nullifier) -> ProtocolResult<()> {
    if nullifier.is_zero() {
        return Err(ProtocolError::Malformed("zero nullifier".into()));
    }
    Ok(())
}

fn live_collateral(position: &Position) -> ProtocolResult<Commitment> {
    position
        .collateral_commitment
        .ok_or(ProtocolError::Policy(PolicyViolation::NoDeposit))
}

/// `(collateral, debt, position_hash)` of an open borrow.
fn open_commitments(position: &Position) -> ProtocolResult<(Commitment, Commitment, Commitment)> {
    match (
        position.collateral_commitment,
        position.debt_commitment,
        position.position_hash,
    ) {
        (Some(c), Some(d), Some(h)) => Ok((c, d, h)),
        _ => Err(PolicyViolation::NoBorrow.into()),
    }
}

fn close_borrow(position: &mut Position) {
    position.has_borrow = false;
    position.debt_commitment = None;
    position.position_hash = None;
    position.borrowed_amount = 0;
    position.debt_index = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use zk_lending_arkworks::ProofData;

    fn bogus_proof(proof_type: ProofType, public_inputs: Vec<Uint256>) -> ProofResponse {
        ProofResponse {
            proof_type,
            proof: ProofData {
                a: [Uint256::from(1u64), Uint256::from(2u64)],
                b: [[Uint256::ZERO; 2]; 2],
                c: [Uint256::from(1u64), Uint256::from(2u64)],
            },
            public_inputs,
        }
    }

    fn commitment(n: u64) -> Commitment {
        Commitment(Uint256::from(n))
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    #[test]
    fn test_new_pool_status() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let pool = LendingPool::new(&mut registry, &verifier, PoolConfig::default(), 0);

        let status = pool.status();
        assert_eq!(status.available_liquidity, 1_000_000);
        assert_eq!(status.total_borrowed, 0);
        assert_eq!(status.utilization_bps, 0);
        assert_eq!(status.borrow_rate_bps, 200);
        assert_eq!(status.borrow_index, crate::interest::WAD);
    }

    #[test]
    fn test_rejected_deposit_leaves_no_trace() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let mut pool = LendingPool::new(&mut registry, &verifier, PoolConfig::default(), 0);

        let proof = bogus_proof(ProofType::Collateral, vec![Uint256::from(1u64), commitment(5).word()]);
        let err = pool.deposit(alice(), commitment(5), &proof, 10).unwrap_err();

        assert_eq!(err, ProtocolError::ProofInvalid(ProofType::Collateral));
        assert!(pool.position(&alice()).is_none());
        assert!(pool.events().is_empty());
        assert!(!pool.registry().is_valid(&commitment(5)));
    }

    #[test]
    fn test_deposit_checks_public_inputs() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let mut pool = LendingPool::new(&mut registry, &verifier, PoolConfig::default(), 0);

        let wrong_threshold = bogus_proof(ProofType::Collateral, vec![Uint256::ZERO, commitment(5).word()]);
        assert!(matches!(
            pool.deposit(alice(), commitment(5), &wrong_threshold, 1),
            Err(ProtocolError::Policy(PolicyViolation::ParameterMismatch { field: "threshold", .. }))
        ));

        let wrong_type = bogus_proof(ProofType::Ltv, vec![Uint256::ZERO; 3]);
        assert_eq!(
            pool.deposit(alice(), commitment(5), &wrong_type, 1),
            Err(PolicyViolation::MissingProof(ProofType::Collateral).into())
        );

        let short = bogus_proof(ProofType::Collateral, vec![Uint256::from(1u64)]);
        assert!(matches!(
            pool.deposit(alice(), commitment(5), &short, 1),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_zero_commitment_is_malformed() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let mut pool = LendingPool::new(&mut registry, &verifier, PoolConfig::default(), 0);

        let proof = bogus_proof(ProofType::Collateral, vec![Uint256::from(1u64), Uint256::ZERO]);
        assert!(matches!(
            pool.deposit(alice(), Commitment::default(), &proof, 1),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_policy_checks_without_position() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let mut pool = LendingPool::new(&mut registry, &verifier, PoolConfig::default(), 0);

        let ltv = bogus_proof(ProofType::Ltv, vec![Uint256::ZERO; 3]);
        let borrow = BorrowRequest {
            amount: 10,
            debt_commitment: commitment(2),
            debt_salt: Fr::from(1u64),
            position_hash: commitment(3),
            ltv_proof: ltv.clone(),
        };
        assert_eq!(pool.borrow(alice(), &borrow, 1), Err(PolicyViolation::NoDeposit.into()));

        let zero = BorrowRequest { amount: 0, ..borrow };
        assert_eq!(pool.borrow(alice(), &zero, 1), Err(PolicyViolation::ZeroAmount.into()));

        let repay = RepayRequest {
            amount: 5,
            nullifier: Nullifier(Uint256::from(9u64)),
            remainder: None,
        };
        assert_eq!(pool.repay(alice(), &repay, 1), Err(PolicyViolation::NoBorrow.into()));

        let liquidation = bogus_proof(ProofType::Liquidation, vec![Uint256::ZERO; 3]);
        assert_eq!(
            pool.liquidate(Address::from_label("bob"), alice(), Nullifier(Uint256::from(1u64)), &liquidation, 1),
            Err(PolicyViolation::NoBorrow.into())
        );
    }

    #[test]
    fn test_price_updates() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let mut pool = LendingPool::new(&mut registry, &verifier, PoolConfig::default(), 0);

        assert!(matches!(pool.update_price(0, 1), Err(ProtocolError::Malformed(_))));
        pool.update_price(1_500 * zk_lending_arkworks::PRICE_SCALE, 2).unwrap();
        assert_eq!(pool.price(), 1_500 * zk_lending_arkworks::PRICE_SCALE);
        assert_eq!(
            pool.events(),
            &[LendingEvent::PriceUpdated {
                price: 1_500 * zk_lending_arkworks::PRICE_SCALE,
                timestamp: 2
            }]
        );
    }

    #[test]
    fn test_liquidation_needs_price() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let config = PoolConfig {
            initial_price: 0,
            ..PoolConfig::default()
        };
        let mut pool = LendingPool::new(&mut registry, &verifier, config, 0);

        let proof = bogus_proof(ProofType::Liquidation, vec![Uint256::ZERO; 3]);
        assert_eq!(
            pool.liquidate(Address::from_label("bob"), alice(), Nullifier(Uint256::from(1u64)), &proof, 1),
            Err(PolicyViolation::PriceNotSet.into())
        );
    }

    #[test]
    fn test_time_cannot_go_backwards() {
        let mut registry = CommitmentRegistry::new();
        let verifier = ZkVerifier::new();
        let mut pool = LendingPool::new(&mut registry, &verifier, PoolConfig::default(), 100);

        assert_eq!(
            pool.accrue(99),
            Err(PolicyViolation::StaleTimestamp { got: 99, last: 100 }.into())
        );
        pool.accrue(100).unwrap();
        pool.accrue(1_000).unwrap();
        // the index moves at the base rate, but nothing is owed
        assert!(pool.events().is_empty());
        assert!(pool.status().borrow_index > crate::interest::WAD);
        assert_eq!(pool.status().total_borrowed, 0);
    }

    #[test]
    fn test_position_debt() {
        let position = Position {
            has_deposit: true,
            has_borrow: true,
            borrowed_amount: 1_000,
            debt_index: crate::interest::WAD,
            ..Position::default()
        };
        assert_eq!(position.debt_at(crate::interest::WAD * 2), 2_000);
        assert_eq!(Position::default().debt_at(crate::interest::WAD * 2), 0);
    }
}
