//! Runtime configuration read from the environment.

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::studies::calculators::CostParameters;
use crate::studies::services::EngineParams;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub catalog_cache_ttl: Duration,
    pub engine: EngineParams,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".to_string()))?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let ttl_secs = parse_or(&lookup, "CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let defaults = EngineParams::default();
        let max_candidate_rates =
            parse_or(&lookup, "MAX_CANDIDATE_RATES", defaults.max_candidate_rates)?;
        let power_billing_days =
            parse_or(&lookup, "POWER_BILLING_DAYS", defaults.cost.power_billing_days)?;
        let billing_periods_per_year = parse_or(
            &lookup,
            "BILLING_PERIODS_PER_YEAR",
            defaults.cost.billing_periods_per_year,
        )?;

        if ttl_secs == 0 {
            return Err(AppError::Config(
                "CATALOG_CACHE_TTL_SECS must be positive".to_string(),
            ));
        }
        if max_candidate_rates == 0 {
            return Err(AppError::Config(
                "MAX_CANDIDATE_RATES must be positive".to_string(),
            ));
        }
        if power_billing_days <= Decimal::ZERO || billing_periods_per_year <= Decimal::ZERO {
            return Err(AppError::Config(
                "billing factors must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            bind_addr,
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
            engine: EngineParams {
                cost: CostParameters {
                    power_billing_days,
                    billing_periods_per_year,
                },
                max_candidate_rates,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {} {:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}
