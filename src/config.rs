use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_DB_URL, DEFAULT_NOTIFY_CAPACITY, ENV_BIND_ADDR, ENV_DB_URL,
    ENV_EVENTS_PATH, ENV_NOTIFY_CAPACITY,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub bind_addr: String,
    pub notify_capacity: usize,
    /// File of JSON-line events; stdin when unset.
    pub events_path: Option<PathBuf>,
}

impl Config {
    /// Reads the process environment. Call `dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let notify_capacity = match lookup(ENV_NOTIFY_CAPACITY) {
            Some(raw) => {
                let capacity: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a positive integer, got {:?}", ENV_NOTIFY_CAPACITY, raw))?;
                anyhow::ensure!(capacity > 0, "{} must be greater than zero", ENV_NOTIFY_CAPACITY);
                capacity
            }
            None => DEFAULT_NOTIFY_CAPACITY,
        };

        Ok(Self {
            db_url: lookup(ENV_DB_URL).unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
            bind_addr: lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            notify_capacity,
            events_path: lookup(ENV_EVENTS_PATH)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }
}
