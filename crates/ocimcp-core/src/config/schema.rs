//! Config structs grouped by concern, loaded from environment variables.

use super::env_keys::{client, observability as obv_keys};
use super::loader::{env_bool, env_optional, env_or, env_u64};
use std::path::PathBuf;
use std::time::Duration;

/// Default bound for one `oci` CLI round trip.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Logging and audit configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            quiet: env_bool(obv_keys::QUIET, &[], false),
            log_level: env_or(obv_keys::LOG_LEVEL, obv_keys::LOG_LEVEL_ALIASES, || {
                "info".to_string()
            })
            .to_lowercase(),
            log_json: env_bool(obv_keys::LOG_JSON, &[], false),
            audit_log: env_optional(obv_keys::AUDIT_LOG, &[]),
        }
    }
}

/// How the `oci` program is located and bounded
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub cli_path: PathBuf,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            cli_path: PathBuf::from(env_or(client::CLI_PATH, &[], || "oci".to_string())),
            timeout: Duration::from_secs(env_u64(
                client::TIMEOUT_SECS,
                &[],
                DEFAULT_TIMEOUT_SECS,
            )),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cli_path: PathBuf::from("oci"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
