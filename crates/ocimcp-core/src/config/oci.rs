//! OCI credential and scope settings.
//!
//! Resolution order mirrors the `oci` tooling: config file profile, then
//! explicit `OCI_*` environment credentials, then resource principals.
//! Everything is resolved once into [`OciSettings`]; downstream code never
//! reads the environment itself.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::env_keys::oci as keys;
use super::loader::{env_bool, env_optional};
use super::schema::ClientConfig;

pub const DEFAULT_PROFILE: &str = "DEFAULT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read OCI config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile [{profile}] not found in {path}")]
    ProfileNotFound { profile: String, path: PathBuf },

    #[error("malformed OCI config file {path} at line {line}")]
    Malformed { path: PathBuf, line: usize },
}

/// Key/value pairs of one profile section, with `[DEFAULT]` values inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OciProfile {
    pub name: String,
    values: BTreeMap<String, String>,
}

impl OciProfile {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn tenancy(&self) -> Option<&str> {
        self.get("tenancy")
    }

    pub fn region(&self) -> Option<&str> {
        self.get("region")
    }
}

/// Parse an OCI config file and select `profile`.
///
/// Returns `Ok(None)` when the section does not exist. `[DEFAULT]` keys are
/// inherited by every other profile unless overridden.
pub fn parse_profile(
    content: &str,
    profile: &str,
    path: &Path,
) -> Result<Option<OciProfile>, ConfigError> {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            let name = rest.strip_suffix(']').ok_or_else(|| ConfigError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
            })?;
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('=')) else {
            return Err(ConfigError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
            });
        };
        sections
            .entry(section.clone())
            .or_default()
            .insert(key.trim().to_string(), value.trim().to_string());
    }

    let Some(selected) = sections.get(profile) else {
        return Ok(None);
    };
    let mut values = sections.get(DEFAULT_PROFILE).cloned().unwrap_or_default();
    values.extend(selected.clone());
    Ok(Some(OciProfile {
        name: profile.to_string(),
        values,
    }))
}

/// How the `oci` CLI authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `--config-file <path> --profile <name>`
    ConfigFile { path: PathBuf, profile: String },
    /// Explicit key material forwarded as `OCI_CLI_*` variables.
    Environment {
        user: String,
        fingerprint: String,
        tenancy: String,
        region: String,
        key_file: String,
    },
    /// `--auth resource_principal`, for servers running inside OCI.
    ResourcePrincipal,
}

impl Credentials {
    pub fn label(&self) -> &'static str {
        match self {
            Credentials::ConfigFile { .. } => "config_file",
            Credentials::Environment { .. } => "environment",
            Credentials::ResourcePrincipal => "resource_principal",
        }
    }
}

/// Raw inputs for settings resolution. `from_env` fills it from the process
/// environment; tests build it directly.
#[derive(Debug, Clone, Default)]
pub struct SettingsSources {
    pub config_file: Option<PathBuf>,
    pub profile: Option<String>,
    pub user: Option<String>,
    pub fingerprint: Option<String>,
    pub tenancy: Option<String>,
    pub region: Option<String>,
    pub key_file: Option<String>,
    pub default_compartment: Option<String>,
    pub assess_all_compartments: bool,
}

impl SettingsSources {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            config_file: env_optional(keys::CONFIG_FILE, &[]).map(PathBuf::from),
            profile: env_optional(keys::CONFIG_PROFILE, &[]),
            user: env_optional(keys::USER_OCID, &[]),
            fingerprint: env_optional(keys::FINGERPRINT, &[]),
            tenancy: env_optional(keys::TENANCY_OCID, &[]),
            region: env_optional(keys::REGION, &[]),
            key_file: env_optional(keys::KEY_FILE, &[]),
            default_compartment: env_optional(
                keys::DEFAULT_COMPARTMENT,
                keys::DEFAULT_COMPARTMENT_ALIASES,
            ),
            assess_all_compartments: env_bool(keys::ASSESS_ALL_COMPARTMENTS, &[], false),
        }
    }
}

/// Command-line overrides applied on top of the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub config_file: Option<PathBuf>,
    pub profile: Option<String>,
    pub timeout: Option<Duration>,
}

/// Fully resolved configuration for one server process.
#[derive(Debug, Clone)]
pub struct OciSettings {
    pub credentials: Credentials,
    pub tenancy: Option<String>,
    pub region: Option<String>,
    pub default_compartment: Option<String>,
    /// Skip `default_compartment` when assessing without an explicit scope.
    pub assess_all_compartments: bool,
    pub client: ClientConfig,
}

impl OciSettings {
    /// Resolve from the process environment plus CLI overrides.
    pub fn load(overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        let mut client = ClientConfig::from_env();
        if let Some(timeout) = overrides.timeout {
            client.timeout = timeout;
        }
        Self::resolve(SettingsSources::from_env(), overrides, client)
    }

    pub fn resolve(
        mut sources: SettingsSources,
        overrides: &SettingsOverrides,
        client: ClientConfig,
    ) -> Result<Self, ConfigError> {
        if overrides.config_file.is_some() {
            sources.config_file = overrides.config_file.clone();
        }
        if overrides.profile.is_some() {
            sources.profile = overrides.profile.clone();
        }

        let config_file = sources
            .config_file
            .clone()
            .unwrap_or_else(default_config_file);
        let profile_name = sources
            .profile
            .clone()
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let (credentials, tenancy, region) = if config_file.exists() {
            let content =
                std::fs::read_to_string(&config_file).map_err(|source| ConfigError::Read {
                    path: config_file.clone(),
                    source,
                })?;
            let profile = parse_profile(&content, &profile_name, &config_file)?.ok_or_else(
                || ConfigError::ProfileNotFound {
                    profile: profile_name.clone(),
                    path: config_file.clone(),
                },
            )?;
            tracing::info!(path = %config_file.display(), profile = %profile_name, "using OCI config file");
            (
                Credentials::ConfigFile {
                    path: config_file.clone(),
                    profile: profile_name,
                },
                profile.tenancy().map(str::to_string),
                profile.region().map(str::to_string),
            )
        } else if let (Some(user), Some(fingerprint), Some(tenancy), Some(region), Some(key_file)) = (
            sources.user.clone(),
            sources.fingerprint.clone(),
            sources.tenancy.clone(),
            sources.region.clone(),
            sources.key_file.clone(),
        ) {
            tracing::info!("using explicit OCI environment credentials");
            (
                Credentials::Environment {
                    user,
                    fingerprint,
                    tenancy: tenancy.clone(),
                    region: region.clone(),
                    key_file,
                },
                Some(tenancy),
                Some(region),
            )
        } else {
            tracing::info!("no OCI config file or env credentials; using resource principals");
            (
                Credentials::ResourcePrincipal,
                sources.tenancy.clone(),
                sources.region.clone(),
            )
        };

        let default_compartment = sources.default_compartment.or_else(|| tenancy.clone());

        Ok(Self {
            credentials,
            tenancy,
            region,
            default_compartment,
            assess_all_compartments: sources.assess_all_compartments,
            client,
        })
    }

    pub fn default_compartment(&self) -> Option<&str> {
        self.default_compartment.as_deref()
    }
}

/// `~/.oci/config`
pub fn default_config_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".oci")
        .join("config")
}
