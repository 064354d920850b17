//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Directory holding one JSON file per collection.
pub fn data_dir() -> PathBuf {
    std::env::var("MYFIT_DATA_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Address the API server listens on.
pub fn bind_addr() -> anyhow::Result<SocketAddr> {
    let raw = std::env::var("MYFIT_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    raw.parse::<SocketAddr>()
        .with_context(|| format!("MYFIT_BIND_ADDR must be a socket address, got {:?}", raw))
}
