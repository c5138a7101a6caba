//! Cloud layer: typed records, the `oci` CLI backend, and the posture evaluator.

pub mod assess;
pub mod cli;
pub mod error;
pub mod exposure;
pub mod model;
pub mod provider;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use assess::{AssessConfig, Assessment, Finding, PostureEvaluator, Severity};
pub use cli::OciCli;
pub use error::{CloudError, Result};
pub use provider::{CloudBackend, InstanceActions, InventorySource, RuleGroupSource};
