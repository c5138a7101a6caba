//! Unified configuration layer
//!
//! All environment reads are concentrated here; business code goes through
//! the structured configs instead of calling `std::env::var`.
//!
//! - `loader`: env_or, env_optional, env_bool, `.env` loading
//! - `schema`: ObservabilityConfig, ClientConfig
//! - `oci`: OCI config-file profiles and the resolved OciSettings
//! - `env_keys`: key constants (with aliases)

pub mod env_keys;
pub mod loader;
pub mod oci;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, env_u64, load_dotenv, load_dotenv_from};
pub use oci::{
    parse_profile, ConfigError, Credentials, OciProfile, OciSettings, SettingsOverrides,
    SettingsSources,
};
pub use schema::{ClientConfig, ObservabilityConfig, DEFAULT_TIMEOUT_SECS};
