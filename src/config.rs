use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use log::{info, warn};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_MAX_UPLOAD_MB: usize = 10;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60; // 24 hours

/// Server settings, read from `PRESENCES_*` environment variables
///
/// A `.env` file in the working directory fills in variables the process
/// environment leaves unset.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_ADDR.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        if let Ok(path) = dotenv() {
            info!("loaded settings from {}", path.display());
        }
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; unset keys keep their default
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            server_addr: lookup("PRESENCES_ADDR").unwrap_or(defaults.server_addr),
            static_dir: lookup("PRESENCES_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            max_upload_bytes: parse_or(&lookup, "PRESENCES_MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)
                * 1024
                * 1024,
            session_ttl: Duration::from_secs(parse_or(
                &lookup,
                "PRESENCES_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )),
        }
    }
}

fn parse_or<T: FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {}='{}'", key, raw);
            default
        }),
        None => default,
    }
}
