//! MCP server state: the backend plus settings resolved at startup.

use ocimcp_cloud::model::Scope;
use ocimcp_cloud::{AssessConfig, CloudBackend, CloudError, PostureEvaluator};
use ocimcp_core::config::OciSettings;

/// Immutable for the life of the server; nothing is cached between calls.
pub(crate) struct McpServer<B> {
    pub backend: B,
    pub assess_config: AssessConfig,
}

impl<B: CloudBackend> McpServer<B> {
    pub fn new(backend: B, settings: &OciSettings) -> Self {
        Self {
            backend,
            assess_config: AssessConfig::from_settings(settings),
        }
    }

    pub fn evaluator(&self) -> PostureEvaluator<'_, B> {
        PostureEvaluator::new(&self.backend, self.assess_config.clone())
    }

    /// The `compartment_ocid` argument, else the configured default.
    pub fn scope_or_default(&self, raw: Option<&str>) -> Result<Scope, CloudError> {
        Scope::from_optional(raw)
            .or_else(|| self.assess_config.default_scope.clone())
            .ok_or_else(|| {
                CloudError::InvalidArgument(
                    "compartment_ocid not given and no default compartment configured \
                     (set DEFAULT_COMPARTMENT_OCID or a tenancy in the OCI profile)"
                        .to_string(),
                )
            })
    }
}
