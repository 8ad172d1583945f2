use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::Level;

/// Pay rules applied by the calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollPolicy {
    /// Working hours in a standard month; the hourly base is `salary / standard_hours`.
    pub standard_hours: Decimal,
    pub ot_multiplier: Decimal,
    /// Flat share of gross salary withheld, in `[0, 1]`.
    pub deduction_rate: Decimal,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            standard_hours: dec!(160),
            ot_multiplier: dec!(1.5),
            deduction_rate: dec!(0.10),
        }
    }
}

impl PayrollPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.standard_hours <= Decimal::ZERO {
            bail!("PAYROLL_STANDARD_HOURS must be greater than zero");
        }
        if self.ot_multiplier < Decimal::ZERO {
            bail!("PAYROLL_OT_MULTIPLIER must not be negative");
        }
        if self.deduction_rate < Decimal::ZERO || self.deduction_rate > Decimal::ONE {
            bail!("PAYROLL_DEDUCTION_RATE must be between 0 and 1");
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: Level,
    pub run_migrations: bool,

    pub policy: PayrollPolicy,
    pub period_lock_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let policy = PayrollPolicy {
            standard_hours: parse_or("PAYROLL_STANDARD_HOURS", dec!(160))?,
            ot_multiplier: parse_or("PAYROLL_OT_MULTIPLIER", dec!(1.5))?,
            deduction_rate: parse_or("PAYROLL_DEDUCTION_RATE", dec!(0.10))?,
        };
        policy.validate()?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parse_or("LOG_LEVEL", Level::DEBUG)?,
            run_migrations: parse_or("RUN_MIGRATIONS", false)?,

            policy,
            period_lock_idle_secs: parse_or("PAYROLL_LOCK_IDLE_SECS", 600)?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            log_level: Level::DEBUG,
            run_migrations: false,
            policy: PayrollPolicy::default(),
            period_lock_idle_secs: 600,
        }
    }
}
