//! Configuration Module
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! first by the binary). Every value has a development default, and
//! [`Config::validate`] fails fast on inconsistent combinations.

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use zk_lending_arkworks::PRICE_SCALE;

use crate::interest::{InterestRateModel, BPS};
use crate::pool::PoolConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,

    /// Maximum loan-to-value, percent (default 75)
    pub max_ltv: u64,

    /// Liquidation threshold, percent (default 85)
    pub liquidation_threshold: u64,

    /// Minimum collateral every deposit must prove (default 1)
    pub min_collateral: u64,

    /// Lendable liquidity at genesis
    pub initial_liquidity: u128,

    pub base_rate_bps: u64,
    pub slope1_bps: u64,
    pub slope2_bps: u64,
    pub optimal_utilization_bps: u64,

    /// Oracle price, 8 decimals (default 2000.00000000)
    pub initial_price: u64,

    /// Seed for key generation; keys are generated from OS randomness when unset
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

fn var_or<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{name} must be a valid number"))
}

impl Config {
    /// Load from the environment.
    ///
    /// # Optional Environment Variables
    ///
    /// - `ENVIRONMENT`: development | staging | production
    /// - `MAX_LTV`, `LIQUIDATION_THRESHOLD`: percent
    /// - `MIN_COLLATERAL`, `INITIAL_LIQUIDITY`
    /// - `BASE_RATE_BPS`, `SLOPE1_BPS`, `SLOPE2_BPS`, `OPTIMAL_UTILIZATION_BPS`
    /// - `INITIAL_PRICE`: 8-decimal fixed point
    /// - `RNG_SEED`: deterministic key generation (never in production)
    pub fn from_env() -> Result<Self> {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let rng_seed = match env::var("RNG_SEED") {
            Ok(seed) => Some(seed.parse().context("RNG_SEED must be a valid number")?),
            Err(_) => None,
        };

        let defaults = InterestRateModel::default();
        let config = Config {
            environment,
            max_ltv: var_or("MAX_LTV", "75")?,
            liquidation_threshold: var_or("LIQUIDATION_THRESHOLD", "85")?,
            min_collateral: var_or("MIN_COLLATERAL", "1")?,
            initial_liquidity: var_or("INITIAL_LIQUIDITY", "1000000")?,
            base_rate_bps: var_or("BASE_RATE_BPS", &defaults.base_rate_bps.to_string())?,
            slope1_bps: var_or("SLOPE1_BPS", &defaults.slope1_bps.to_string())?,
            slope2_bps: var_or("SLOPE2_BPS", &defaults.slope2_bps.to_string())?,
            optimal_utilization_bps: var_or(
                "OPTIMAL_UTILIZATION_BPS",
                &defaults.optimal_utilization_bps.to_string(),
            )?,
            initial_price: var_or("INITIAL_PRICE", &(2_000 * PRICE_SCALE).to_string())?,
            rng_seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_ltv == 0 || self.max_ltv > 100 {
            bail!("MAX_LTV must be in 1..=100, got {}", self.max_ltv);
        }
        if self.liquidation_threshold > 100 {
            bail!("LIQUIDATION_THRESHOLD must be at most 100, got {}", self.liquidation_threshold);
        }
        if self.liquidation_threshold < self.max_ltv {
            bail!(
                "LIQUIDATION_THRESHOLD ({}) must not be below MAX_LTV ({})",
                self.liquidation_threshold,
                self.max_ltv
            );
        }
        if self.optimal_utilization_bps > BPS {
            bail!("OPTIMAL_UTILIZATION_BPS must be at most {BPS}");
        }
        if self.initial_price == 0 {
            bail!("INITIAL_PRICE must be non-zero");
        }
        if self.is_production() && self.rng_seed.is_some() {
            bail!("RNG_SEED must not be set in production");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn interest_model(&self) -> InterestRateModel {
        InterestRateModel {
            base_rate_bps: self.base_rate_bps,
            slope1_bps: self.slope1_bps,
            slope2_bps: self.slope2_bps,
            optimal_utilization_bps: self.optimal_utilization_bps,
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_ltv: self.max_ltv,
            liquidation_threshold: self.liquidation_threshold,
            min_collateral: self.min_collateral,
            initial_liquidity: self.initial_liquidity,
            initial_price: self.initial_price,
            interest: self.interest_model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.max_ltv, 75);
        assert_eq!(config.liquidation_threshold, 85);
        assert_eq!(config.pool_config(), PoolConfig::default());
    }

    #[test]
    fn test_validate_rejects_inconsistent_thresholds() {
        let mut config = Config::from_env().unwrap();
        config.liquidation_threshold = 70;
        assert!(config.validate().is_err());

        config.liquidation_threshold = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seed_forbidden_in_production() {
        let mut config = Config::from_env().unwrap();
        config.environment = Environment::Production;
        config.rng_seed = Some(42);
        assert!(config.validate().is_err());

        config.rng_seed = None;
        assert!(config.validate().is_ok());
    }
}
