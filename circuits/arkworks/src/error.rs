//! Error types for the proving side
//!
//! `CircuitError` covers witness validation, setup and proving. The
//! `validation` module mirrors each circuit's statement natively so that a
//! request that cannot be proven fails fast with a readable reason instead
//! of an unsatisfied constraint system.

use thiserror::Error;

use crate::proof_type::ProofType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitError {
    #[error("{field} value {value} exceeds maximum {max}")]
    ValueOutOfRange { field: String, value: u64, max: u64 },

    #[error("Insufficient collateral: {collateral} < {required} required")]
    InsufficientCollateral { collateral: u64, required: u64 },

    #[error("LTV exceeded: debt {debt} against collateral {collateral} at max {max_ltv}%")]
    LtvExceeded {
        debt: u64,
        collateral: u64,
        max_ltv: u64,
    },

    #[error("Position not liquidatable: risk-adjusted collateral value {collateral_value} >= debt value {debt_value}")]
    NotLiquidatable {
        collateral_value: u128,
        debt_value: u128,
    },

    #[error("Salt must be non-zero")]
    InvalidSalt,

    #[error("Proving key is for {got}, request needs {expected}")]
    KeyMismatch { expected: ProofType, got: ProofType },

    #[error("Trusted setup failed: {0}")]
    Setup(String),

    #[error("Proof generation failed: {0}")]
    Proving(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type CircuitResult<T> = Result<T, CircuitError>;

/// Native checks matching the in-circuit statements
pub mod validation {
    use super::*;
    use ark_bn254::Fr;
    use ark_ff::Zero;

    use crate::{PERCENT, PRICE_SCALE};

    /// Largest ratio accepted for `max_ltv` / `liq_threshold`; the
    /// circuits themselves only bound these to `RATIO_BITS`
    pub const MAX_RATIO: u64 = PERCENT;

    pub fn validate_ratio(value: u64, field: &str) -> CircuitResult<()> {
        if value > MAX_RATIO {
            return Err(CircuitError::ValueOutOfRange {
                field: field.to_string(),
                value,
                max: MAX_RATIO,
            });
        }
        Ok(())
    }

    /// `collateral >= threshold`
    pub fn validate_collateral(collateral: u64, threshold: u64) -> CircuitResult<()> {
        if collateral < threshold {
            return Err(CircuitError::InsufficientCollateral {
                collateral,
                required: threshold,
            });
        }
        Ok(())
    }

    /// `debt·100 <= collateral·max_ltv`
    pub fn validate_ltv(collateral: u64, debt: u64, max_ltv: u64) -> CircuitResult<()> {
        validate_ratio(max_ltv, "max_ltv")?;

        let debt_scaled = debt as u128 * PERCENT as u128;
        let collateral_scaled = collateral as u128 * max_ltv as u128;
        if debt_scaled > collateral_scaled {
            return Err(CircuitError::LtvExceeded {
                debt,
                collateral,
                max_ltv,
            });
        }
        Ok(())
    }

    /// `collateral·price·liq_threshold < debt·100·PRICE_SCALE`
    pub fn validate_liquidation(
        collateral: u64,
        debt: u64,
        price: u64,
        liquidation_threshold: u64,
    ) -> CircuitResult<()> {
        validate_ratio(liquidation_threshold, "liquidation_threshold")?;

        let debt_value = debt as u128 * PERCENT as u128 * PRICE_SCALE as u128;
        // collateral·price fits in u128; the extra ratio factor may not, and
        // anything past u128 dwarfs every possible debt value anyway
        let collateral_value =
            match (collateral as u128 * price as u128).checked_mul(liquidation_threshold as u128) {
                Some(v) => v,
                None => {
                    return Err(CircuitError::NotLiquidatable {
                        collateral_value: u128::MAX,
                        debt_value,
                    })
                }
            };

        if collateral_value >= debt_value {
            return Err(CircuitError::NotLiquidatable {
                collateral_value,
                debt_value,
            });
        }
        Ok(())
    }

    pub fn validate_salt(salt: &Fr) -> CircuitResult<()> {
        if salt.is_zero() {
            return Err(CircuitError::InvalidSalt);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn test_validate_collateral() {
        assert!(validate_collateral(1000, 500).is_ok());
        assert!(validate_collateral(500, 500).is_ok());
        assert_eq!(
            validate_collateral(400, 500),
            Err(CircuitError::InsufficientCollateral {
                collateral: 400,
                required: 500
            })
        );
    }

    #[test]
    fn test_validate_ltv() {
        assert!(validate_ltv(100, 60, 80).is_ok());
        // at the limit
        assert!(validate_ltv(100, 80, 80).is_ok());
        assert!(validate_ltv(100, 81, 80).is_err());
        // no collateral, no debt allowed
        assert!(validate_ltv(0, 1, 80).is_err());
        assert!(validate_ltv(0, 0, 80).is_ok());
    }

    #[test]
    fn test_validate_ltv_rejects_ratio_above_100() {
        assert!(matches!(
            validate_ltv(100, 1, 101),
            Err(CircuitError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_liquidation_boundary() {
        let price = 100 * crate::PRICE_SCALE;
        // 100 · 100e8 · 85 == 8500 · 100 · 1e8: health factor exactly 1.0
        assert!(validate_liquidation(100, 8500, price, 85).is_err());
        assert!(validate_liquidation(100, 8501, price, 85).is_ok());
        assert!(validate_liquidation(100, 0, price, 85).is_err());
    }

    #[test]
    fn test_validate_liquidation_huge_collateral_is_safe() {
        assert!(matches!(
            validate_liquidation(u64::MAX, u64::MAX, u64::MAX, 100),
            Err(CircuitError::NotLiquidatable { .. })
        ));
    }

    #[test]
    fn test_validate_salt() {
        assert!(validate_salt(&Fr::from(12345u64)).is_ok());
        assert_eq!(validate_salt(&Fr::from(0u64)), Err(CircuitError::InvalidSalt));
    }
}
