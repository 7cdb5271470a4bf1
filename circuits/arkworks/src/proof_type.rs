//! The three proof statements and their public-input shapes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofType {
    /// collateral >= threshold
    Collateral,
    /// debt·100 <= collateral·max_ltv
    Ltv,
    /// health factor < 1.0
    Liquidation,
}

impl ProofType {
    pub const ALL: [ProofType; 3] = [ProofType::Collateral, ProofType::Ltv, ProofType::Liquidation];

    /// Number of public inputs the statement exposes.
    ///
    /// - Collateral: `[threshold, commitment]`
    /// - Ltv: `[max_ltv, collateral_commitment, debt_commitment]`
    /// - Liquidation: `[price, liq_threshold, position_hash]`
    pub const fn public_input_count(self) -> usize {
        match self {
            ProofType::Collateral => 2,
            ProofType::Ltv => 3,
            ProofType::Liquidation => 3,
        }
    }

    /// Length of the flattened verification key in 256-bit words:
    /// alpha (2) + beta, gamma, delta (4 each) + one G1 point per IC entry.
    pub const fn key_length(self) -> usize {
        14 + 2 * (self.public_input_count() + 1)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ProofType::Collateral => "collateral",
            ProofType::Ltv => "ltv",
            ProofType::Liquidation => "liquidation",
        }
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collateral" => Ok(ProofType::Collateral),
            "ltv" => Ok(ProofType::Ltv),
            "liquidation" => Ok(ProofType::Liquidation),
            other => Err(format!("unknown proof type: {}", other)),
        }
    }
}
