// src/config.rs
use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::summary::{BillRules, DueDayOverflow};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./finance_tracker.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const MAX_DUE_SOON_DAYS: i64 = 31;

/// Process configuration, read once at startup and handed to the server
/// through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub bill_rules: BillRules,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: 5,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            bill_rules: BillRules::default(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be host:port")?;

        let overflow = match env::var("BILL_DUE_DAY_OVERFLOW") {
            Ok(raw) => raw.parse::<DueDayOverflow>().map_err(anyhow::Error::msg)?,
            Err(_) => DueDayOverflow::default(),
        };

        let due_soon_days = check_due_soon_days(env_parse(
            "DUE_SOON_DAYS",
            defaults.bill_rules.due_soon_days,
        )?)?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            bind_addr,
            bill_rules: BillRules {
                overflow,
                due_soon_days,
            },
            log_json: env_bool("LOG_JSON", defaults.log_json),
        })
    }
}

fn check_due_soon_days(days: i64) -> Result<i64> {
    if !(0..=MAX_DUE_SOON_DAYS).contains(&days) {
        anyhow::bail!("DUE_SOON_DAYS must be between 0 and {MAX_DUE_SOON_DAYS}, got {days}");
    }
    Ok(days)
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{name}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}
