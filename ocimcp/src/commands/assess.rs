//! `ocimcp assess`: run the posture evaluator once from the terminal.

use anyhow::{Context, Result};
use std::io::Write;

use ocimcp_cloud::model::Scope;
use ocimcp_cloud::{AssessConfig, Assessment, OciCli, PostureEvaluator, RuleGroupSource, InventorySource};
use ocimcp_core::config::OciSettings;
use ocimcp_core::observability;

pub fn cmd_assess(settings: &OciSettings, compartment: Option<&str>, json: bool) -> Result<()> {
    let cli = OciCli::new(settings.clone());
    let config = AssessConfig::from_settings(settings);
    let stdout = std::io::stdout();
    assess(&cli, config, Scope::from_optional(compartment), json, &mut stdout.lock())
}

fn assess<S>(source: &S, config: AssessConfig, scope: Option<Scope>, json: bool, out: &mut impl Write) -> Result<()>
where
    S: RuleGroupSource + InventorySource,
{
    let requested: Vec<String> = scope.iter().map(|s| s.to_string()).collect();
    let assessment = match PostureEvaluator::new(source, config).run(scope) {
        Ok(a) => a,
        Err(e) => {
            observability::audit_assessment(&requested, 0, Some(e.kind()));
            return Err(e).context("security assessment failed");
        }
    };
    let scopes: Vec<String> = assessment.scopes.iter().map(|s| s.to_string()).collect();
    observability::audit_assessment(&scopes, assessment.findings.len(), None);

    if json {
        let payload = serde_json::json!({
            "scopes": scopes,
            "finding_count": assessment.findings.len(),
            "findings": assessment.findings,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
    } else {
        print_report(&assessment, out)?;
    }
    Ok(())
}

fn print_report(assessment: &Assessment, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Scopes assessed: {}", assessment.scopes.len())?;
    if assessment.findings.is_empty() {
        writeln!(out, "✅ No ingress rules open to any source.")?;
        return Ok(());
    }
    writeln!(out, "⚠ {} finding(s):", assessment.findings.len())?;
    for f in &assessment.findings {
        writeln!(out, "  [{}] {}", f.severity, f.description)?;
        writeln!(out, "         {} ({})", f.group_id, f.scope)?;
    }
    Ok(())
}
