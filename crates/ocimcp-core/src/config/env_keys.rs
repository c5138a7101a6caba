//! Environment variable keys and their aliases.
//!
//! OCI-specific keys keep the names the `oci` tooling already uses; keys owned
//! by this project are prefixed with `OCIMCP_`.

/// OCI credentials and scope
pub mod oci {
    pub const CONFIG_FILE: &str = "OCI_CONFIG_FILE";
    pub const CONFIG_PROFILE: &str = "OCI_CONFIG_PROFILE";

    /// Explicit credentials, used when no config file is present.
    pub const USER_OCID: &str = "OCI_USER_OCID";
    pub const FINGERPRINT: &str = "OCI_FINGERPRINT";
    pub const TENANCY_OCID: &str = "OCI_TENANCY_OCID";
    pub const REGION: &str = "OCI_REGION";
    pub const KEY_FILE: &str = "OCI_KEY_FILE";

    pub const DEFAULT_COMPARTMENT: &str = "DEFAULT_COMPARTMENT_OCID";
    pub const DEFAULT_COMPARTMENT_ALIASES: &[&str] = &["OCIMCP_DEFAULT_COMPARTMENT"];

    /// Assessments without an explicit compartment cover every compartment
    /// instead of the default one.
    pub const ASSESS_ALL_COMPARTMENTS: &str = "OCIMCP_ASSESS_ALL_COMPARTMENTS";
}

/// `oci` CLI invocation
pub mod client {
    pub const CLI_PATH: &str = "OCIMCP_OCI_CLI";
    pub const TIMEOUT_SECS: &str = "OCIMCP_TIMEOUT_SECS";
}

/// Observability and logging
pub mod observability {
    pub const QUIET: &str = "OCIMCP_QUIET";

    pub const LOG_LEVEL: &str = "OCIMCP_LOG_LEVEL";
    pub const LOG_LEVEL_ALIASES: &[&str] = &["LOG_LEVEL"];

    pub const LOG_JSON: &str = "OCIMCP_LOG_JSON";

    pub const AUDIT_LOG: &str = "OCIMCP_AUDIT_LOG";
}
