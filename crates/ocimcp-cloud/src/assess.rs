//! Security posture evaluator.
//!
//! A read-only heuristic for exactly one exposure pattern: an inbound rule
//! whose source is every address. It enumerates both rule-group kinds in a
//! scope, classifies each rule, and reports matches as HIGH findings. It is
//! not a general audit.
//!
//! Enumeration is fail-fast: if any listing call fails, the whole evaluation
//! fails with that error and findings gathered so far are dropped.

use serde::Serialize;

use ocimcp_core::config::OciSettings;

use crate::error::Result;
use crate::model::{Direction, PortRange, Protocol, RuleGroup, RuleGroupKind, Scope, SecurityRule};
use crate::provider::{InventorySource, RuleGroupSource};

/// Source ranges matching every possible origin.
pub const WILDCARD_SOURCES: &[&str] = &["0.0.0.0/0", "::/0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub scope: Scope,
    pub group_id: String,
    pub group_name: String,
    pub group_kind: RuleGroupKind,
    pub vcn_name: Option<String>,
    /// Position of the rule within its group.
    pub rule_index: usize,
    pub source: String,
    pub protocol: Protocol,
    pub ports: Option<PortRange>,
    pub severity: Severity,
    pub description: String,
}

/// Inputs the evaluator needs from configuration, resolved up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessConfig {
    pub default_scope: Option<Scope>,
}

impl AssessConfig {
    pub fn from_settings(settings: &OciSettings) -> Self {
        let default_scope = if settings.assess_all_compartments {
            None
        } else {
            Scope::from_optional(settings.default_compartment())
        };
        Self { default_scope }
    }
}

/// Result of one evaluation: the scopes inspected and the findings, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub scopes: Vec<Scope>,
    pub findings: Vec<Finding>,
}

pub struct PostureEvaluator<'a, S: ?Sized> {
    source: &'a S,
    config: AssessConfig,
}

impl<'a, S> PostureEvaluator<'a, S>
where
    S: RuleGroupSource + InventorySource + ?Sized,
{
    pub fn new(source: &'a S, config: AssessConfig) -> Self {
        Self { source, config }
    }

    /// Findings for `scope`, or for the default scope when absent.
    pub fn assess(&self, scope: Option<Scope>) -> Result<Vec<Finding>> {
        self.run(scope).map(|a| a.findings)
    }

    pub fn run(&self, scope: Option<Scope>) -> Result<Assessment> {
        let scopes = self.resolve_scopes(scope)?;
        let mut findings = Vec::new();
        for scope in &scopes {
            let stateless = self.source.list_stateless_rule_groups(scope)?;
            let stateful = self.source.list_stateful_rule_groups(scope)?;
            tracing::debug!(
                scope = %scope,
                stateless = stateless.len(),
                stateful = stateful.len(),
                "enumerated rule groups"
            );
            findings.extend(evaluate_groups(scope, &stateless));
            findings.extend(evaluate_groups(scope, &stateful));
        }
        tracing::info!(scopes = scopes.len(), findings = findings.len(), "security assessment complete");
        Ok(Assessment { scopes, findings })
    }

    /// Explicit scope, else the configured default, else every accessible
    /// compartment in enumeration order.
    fn resolve_scopes(&self, scope: Option<Scope>) -> Result<Vec<Scope>> {
        if let Some(scope) = scope.or_else(|| self.config.default_scope.clone()) {
            return Ok(vec![scope]);
        }
        let compartments = self.source.list_compartments()?;
        tracing::debug!(count = compartments.len(), "no default scope; assessing all compartments");
        Ok(compartments.into_iter().map(|c| Scope::new(c.id)).collect())
    }
}

/// Inbound from every address.
pub fn is_open_inbound(rule: &SecurityRule) -> bool {
    rule.direction == Direction::Ingress && WILDCARD_SOURCES.contains(&rule.source.trim())
}

/// Classify every rule of `groups`, keeping group order then rule order.
pub fn evaluate_groups(scope: &Scope, groups: &[RuleGroup]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for group in groups {
        for (rule_index, rule) in group.rules.iter().enumerate() {
            if !is_open_inbound(rule) {
                continue;
            }
            findings.push(Finding {
                scope: scope.clone(),
                group_id: group.id.clone(),
                group_name: group.display_name.clone(),
                group_kind: group.kind,
                vcn_name: group.vcn_name.clone(),
                rule_index,
                source: rule.source.clone(),
                protocol: rule.protocol.clone(),
                ports: rule.ports,
                severity: Severity::High,
                description: describe(group, rule),
            });
        }
    }
    findings
}

fn describe(group: &RuleGroup, rule: &SecurityRule) -> String {
    let vcn = group
        .vcn_name
        .as_deref()
        .map(|v| format!(" in VCN '{}'", v))
        .unwrap_or_default();
    format!(
        "{} '{}'{} allows inbound {} {} from {}",
        group.kind.label(),
        group.display_name,
        vcn,
        rule.protocol,
        rule.ports_label(),
        rule.source
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloudError;
    use crate::fake::{group, rule, FakeCloud};
    use crate::model::Direction::{Egress, Ingress};

    const COMP: &str = "ocid1.compartment.oc1..app";

    fn evaluator(fake: &FakeCloud) -> PostureEvaluator<'_, FakeCloud> {
        PostureEvaluator::new(fake, AssessConfig::default())
    }

    #[test]
    fn test_single_open_ssh_rule_among_restricted() {
        let fake = FakeCloud::new().with_stateless(
            COMP,
            vec![group(
                "sl-1",
                "Default Security List",
                RuleGroupKind::Stateless,
                vec![rule("0.0.0.0/0", Ingress, Some(22)), rule("10.0.0.0/8", Ingress, Some(443))],
            )],
        );
        let findings = evaluator(&fake).assess(Some(Scope::new(COMP))).unwrap();
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.severity, Severity::High);
        assert_eq!(f.ports, Some(PortRange::single(22)));
        assert_eq!(f.rule_index, 0);
        assert!(f.description.contains("port 22"), "{}", f.description);
        assert!(f.description.contains("Default Security List"));
    }

    #[test]
    fn test_no_wildcard_rules_yields_empty() {
        let fake = FakeCloud::new()
            .with_stateless(
                COMP,
                vec![group(
                    "sl-1",
                    "private",
                    RuleGroupKind::Stateless,
                    vec![rule("10.0.0.0/16", Ingress, None), rule("192.168.0.0/24", Ingress, Some(80))],
                )],
            )
            .with_stateful(COMP, vec![group("nsg-1", "empty", RuleGroupKind::Stateful, vec![])]);
        assert!(evaluator(&fake).assess(Some(Scope::new(COMP))).unwrap().is_empty());
    }

    #[test]
    fn test_egress_wildcard_never_reported() {
        let fake = FakeCloud::new().with_stateful(
            COMP,
            vec![group(
                "nsg-1",
                "web",
                RuleGroupKind::Stateful,
                vec![rule("0.0.0.0/0", Egress, None), rule("::/0", Egress, Some(443))],
            )],
        );
        assert!(evaluator(&fake).assess(Some(Scope::new(COMP))).unwrap().is_empty());
    }

    #[test]
    fn test_no_groups_is_empty_not_error() {
        let fake = FakeCloud::new();
        let findings = evaluator(&fake).assess(Some(Scope::new(COMP))).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_each_match_reported_once_in_stable_order() {
        let fake = FakeCloud::new()
            .with_stateless(
                COMP,
                vec![group(
                    "sl-1",
                    "public",
                    RuleGroupKind::Stateless,
                    vec![
                        rule("10.0.0.0/8", Ingress, Some(22)),
                        rule("0.0.0.0/0", Ingress, Some(80)),
                        rule("0.0.0.0/0", Egress, None),
                    ],
                )],
            )
            .with_stateful(
                COMP,
                vec![group(
                    "nsg-1",
                    "db",
                    RuleGroupKind::Stateful,
                    vec![rule("::/0", Ingress, Some(1521)), rule("172.16.0.0/12", Ingress, None)],
                )],
            );
        let ev = evaluator(&fake);
        let first = ev.assess(Some(Scope::new(COMP))).unwrap();
        let second = ev.assess(Some(Scope::new(COMP))).unwrap();
        assert_eq!(first, second);
        let keys: Vec<(&str, usize)> = first.iter().map(|f| (f.group_id.as_str(), f.rule_index)).collect();
        assert_eq!(keys, vec![("sl-1", 1), ("nsg-1", 0)]);
        assert_eq!(first[1].group_kind, RuleGroupKind::Stateful);
    }

    #[test]
    fn test_authorization_failure_surfaces_without_partial_findings() {
        let fake = FakeCloud::new()
            .with_stateless(
                COMP,
                vec![group(
                    "sl-1",
                    "public",
                    RuleGroupKind::Stateless,
                    vec![rule("0.0.0.0/0", Ingress, Some(22))],
                )],
            )
            .fail(
                "list_stateful_rule_groups",
                CloudError::Authorization("NotAuthorized".into()),
            );
        let err = evaluator(&fake).assess(Some(Scope::new(COMP))).unwrap_err();
        assert_eq!(err.kind(), "AuthorizationError");
    }

    #[test]
    fn test_default_scope_used_when_absent() {
        let fake = FakeCloud::new().with_stateless(
            COMP,
            vec![group(
                "sl-1",
                "public",
                RuleGroupKind::Stateless,
                vec![rule("0.0.0.0/0", Ingress, None)],
            )],
        );
        let ev = PostureEvaluator::new(
            &fake,
            AssessConfig {
                default_scope: Some(Scope::new(COMP)),
            },
        );
        let findings = ev.assess(None).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description.contains("all ports"));
        assert!(!fake.calls().iter().any(|c| c.starts_with("list_compartments")));
    }

    #[test]
    fn test_enumerates_all_compartments_without_default() {
        let fake = FakeCloud::new()
            .with_compartment("ocid1.compartment.oc1..a", "a")
            .with_compartment("ocid1.compartment.oc1..b", "b")
            .with_stateful(
                "ocid1.compartment.oc1..b",
                vec![group(
                    "nsg-b",
                    "b-web",
                    RuleGroupKind::Stateful,
                    vec![rule("0.0.0.0/0", Ingress, Some(443))],
                )],
            );
        let assessment = evaluator(&fake).run(None).unwrap();
        assert_eq!(assessment.scopes.len(), 2);
        assert_eq!(assessment.findings.len(), 1);
        assert_eq!(assessment.findings[0].scope.as_str(), "ocid1.compartment.oc1..b");
    }

    #[test]
    fn test_compartment_enumeration_failure_propagates() {
        let fake = FakeCloud::new().fail(
            "list_compartments",
            CloudError::TransientIo("connection reset".into()),
        );
        let err = evaluator(&fake).assess(None).unwrap_err();
        assert_eq!(err.kind(), "TransientIOError");
    }

    #[test]
    fn test_config_assess_all_skips_tenancy_default() {
        use ocimcp_core::config::{ClientConfig, Credentials};

        let mut settings = OciSettings {
            credentials: Credentials::ResourcePrincipal,
            tenancy: Some("ocid1.tenancy.oc1..root".into()),
            region: None,
            default_compartment: Some("ocid1.tenancy.oc1..root".into()),
            assess_all_compartments: false,
            client: ClientConfig::default(),
        };
        assert_eq!(
            AssessConfig::from_settings(&settings).default_scope,
            Some(Scope::new("ocid1.tenancy.oc1..root"))
        );

        settings.assess_all_compartments = true;
        let config = AssessConfig::from_settings(&settings);
        assert_eq!(config.default_scope, None);

        let fake = FakeCloud::new()
            .with_compartment("ocid1.compartment.oc1..a", "a")
            .with_compartment("ocid1.compartment.oc1..b", "b");
        let assessment = PostureEvaluator::new(&fake, config).run(None).unwrap();
        assert_eq!(assessment.scopes.len(), 2);
    }
}
