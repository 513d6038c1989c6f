//! Runtime configuration, read from the environment.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::solver::{DEFAULT_TIME_LIMIT, SolverOptions};

pub const BIND_ADDR_VAR: &str = "TIMETABLE_BIND_ADDR";
pub const TIME_LIMIT_VAR: &str = "TIMETABLE_SOLVER_TIME_LIMIT_SECS";
pub const STORE_CAPACITY_VAR: &str = "TIMETABLE_STORE_CAPACITY";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_STORE_CAPACITY: usize = 64;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub solver: SolverOptions,
    /// How many recent timetables the server keeps for download.
    pub store_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            solver: SolverOptions::default(),
            store_capacity: DEFAULT_STORE_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source; unset variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| invalid(BIND_ADDR_VAR, &bind_addr, e.to_string()))?;

        let time_limit = match lookup(TIME_LIMIT_VAR) {
            Some(raw) => {
                let secs: f64 = raw
                    .parse()
                    .map_err(|_| invalid(TIME_LIMIT_VAR, &raw, "not a number".to_string()))?;
                Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| invalid(TIME_LIMIT_VAR, &raw, "must be positive".to_string()))?
            }
            None => DEFAULT_TIME_LIMIT,
        };

        let store_capacity = match lookup(STORE_CAPACITY_VAR) {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    invalid(STORE_CAPACITY_VAR, &raw, "must be a positive integer".to_string())
                })?,
            None => DEFAULT_STORE_CAPACITY,
        };

        Ok(Self {
            bind_addr,
            solver: SolverOptions {
                time_limit,
                ..SolverOptions::default()
            },
            store_capacity,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason,
    }
}
