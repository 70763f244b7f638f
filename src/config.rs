use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::PlannerError;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DB_PATH: &str = "data/db.json";
pub const DEFAULT_STATIC_DIR: &str = "static";

// Runtime settings, read once at startup.
//
// PLANNER_ADDR        bind address           (127.0.0.1:3000)
// PLANNER_DB_PATH     JSON state file        (data/db.json)
// PLANNER_STATIC_DIR  static frontend files  (static)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, PlannerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PlannerError> {
        let addr_text = lookup("PLANNER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_text
            .parse()
            .map_err(|e| PlannerError::Config(format!("PLANNER_ADDR '{addr_text}': {e}")))?;

        Ok(Self {
            addr,
            db_path: lookup("PLANNER_DB_PATH")
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
                .into(),
            static_dir: lookup("PLANNER_STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                .into(),
        })
    }
}
