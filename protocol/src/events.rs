//! Pool event log
//!
//! Events are appended only after a call has fully succeeded, so the log
//! never mentions a transition that was rolled back.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Commitment, Nullifier};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LendingEvent {
    Deposited {
        user: Address,
        commitment: Commitment,
        timestamp: u64,
    },
    Borrowed {
        user: Address,
        amount: u128,
        debt_commitment: Commitment,
        position_hash: Commitment,
        timestamp: u64,
    },
    Repaid {
        user: Address,
        amount: u128,
        remaining_debt: u128,
        nullifier: Nullifier,
        timestamp: u64,
    },
    Withdrawn {
        user: Address,
        nullifier: Nullifier,
        /// `None` when the position was closed
        new_commitment: Option<Commitment>,
        timestamp: u64,
    },
    Liquidated {
        user: Address,
        liquidator: Address,
        debt: u128,
        price: u64,
        nullifier: Nullifier,
        timestamp: u64,
    },
    PriceUpdated {
        price: u64,
        timestamp: u64,
    },
    InterestAccrued {
        rate_bps: u64,
        interest: u128,
        index: u128,
        timestamp: u64,
    },
}

impl LendingEvent {
    pub fn timestamp(&self) -> u64 {
        match self {
            LendingEvent::Deposited { timestamp, .. }
            | LendingEvent::Borrowed { timestamp, .. }
            | LendingEvent::Repaid { timestamp, .. }
            | LendingEvent::Withdrawn { timestamp, .. }
            | LendingEvent::Liquidated { timestamp, .. }
            | LendingEvent::PriceUpdated { timestamp, .. }
            | LendingEvent::InterestAccrued { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = LendingEvent::PriceUpdated {
            price: 2_000,
            timestamp: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "price_updated");
        assert_eq!(json["price"], 2_000);
        assert_eq!(event.timestamp(), 7);
    }
}
