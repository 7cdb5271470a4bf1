//! Utilization-based interest
//!
//! ```text
//! rate (bps/yr)
//!   │                         ╱ slope2
//!   │                       ╱
//!   │              ───────╱  ← optimal utilization
//!   │      ───────  slope1
//!   │ base
//!   └──────────────────────────── utilization
//! ```
//!
//! Debt grows through one global borrow index (WAD scaled) that is bumped
//! lazily on the first state-changing call after time advances. A position
//! remembers the index at which it last borrowed; its debt is
//! `principal · index_now / index_then`.

use serde::{Deserialize, Serialize};

/// Basis-point denominator
pub const BPS: u64 = 10_000;

/// Fixed-point unit of the borrow index
pub const WAD: u128 = 1_000_000_000_000_000_000;

pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Piecewise-linear borrow-rate curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRateModel {
    pub base_rate_bps: u64,
    pub slope1_bps: u64,
    pub slope2_bps: u64,
    pub optimal_utilization_bps: u64,
}

impl Default for InterestRateModel {
    fn default() -> Self {
        Self {
            base_rate_bps: 200,
            slope1_bps: 400,
            slope2_bps: 7_500,
            optimal_utilization_bps: 8_000,
        }
    }
}

impl InterestRateModel {
    /// `borrowed / (borrowed + available)` in basis points; zero for an empty pool.
    pub fn utilization_bps(borrowed: u128, available: u128) -> u64 {
        let total = borrowed.saturating_add(available);
        if total == 0 {
            return 0;
        }
        (borrowed.saturating_mul(BPS as u128) / total) as u64
    }

    pub fn borrow_rate_bps(&self, utilization_bps: u64) -> u64 {
        let utilization = utilization_bps.min(BPS);
        let optimal = self.optimal_utilization_bps;

        if utilization <= optimal {
            if optimal == 0 {
                return self.base_rate_bps;
            }
            self.base_rate_bps + utilization * self.slope1_bps / optimal
        } else {
            let excess = utilization - optimal;
            // optimal < utilization <= BPS here
            self.base_rate_bps + self.slope1_bps + excess * self.slope2_bps / (BPS - optimal)
        }
    }
}

/// Global compounding index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowIndex {
    pub value: u128,
    pub last_accrued_at: u64,
}

impl BorrowIndex {
    pub fn new(timestamp: u64) -> Self {
        Self {
            value: WAD,
            last_accrued_at: timestamp,
        }
    }

    /// Index after `elapsed` seconds at `rate_bps`, simple interest per step.
    pub fn grown(&self, rate_bps: u64, elapsed: u64) -> u128 {
        let growth = self
            .value
            .saturating_mul(rate_bps as u128)
            .saturating_mul(elapsed as u128)
            / (BPS as u128 * SECONDS_PER_YEAR as u128);
        self.value.saturating_add(growth)
    }

    /// Advance to `now`. Timestamps in the past leave the index unchanged.
    pub fn accrue(&mut self, rate_bps: u64, now: u64) {
        if now <= self.last_accrued_at {
            return;
        }
        self.value = self.grown(rate_bps, now - self.last_accrued_at);
        self.last_accrued_at = now;
    }
}

impl Default for BorrowIndex {
    fn default() -> Self {
        Self::new(0)
    }
}

/// `amount · to / from`, rounded down.
pub fn scale(amount: u128, from: u128, to: u128) -> u128 {
    if from == 0 {
        return amount;
    }
    match amount.checked_mul(to) {
        Some(product) => product / from,
        // Split as `q·from + r` so the remainder still scales.
        None => {
            let (q, r) = (amount / from, amount % from);
            let tail = r
                .checked_mul(to)
                .map_or_else(|| (to / from).saturating_mul(r), |p| p / from);
            q.saturating_mul(to).saturating_add(tail)
        }
    }
}
