//! `ocimcp check`: fetch the tenancy to prove credentials work.

use anyhow::{Context, Result};
use std::io::Write;

use ocimcp_cloud::{InventorySource, OciCli};
use ocimcp_core::config::OciSettings;

pub fn cmd_check(settings: &OciSettings) -> Result<()> {
    let cli = OciCli::new(settings.clone());
    let stdout = std::io::stdout();
    check(&cli, settings, &mut stdout.lock())
}

fn check<S: InventorySource>(source: &S, settings: &OciSettings, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Testing OCI connectivity ({} auth)...", settings.credentials.label())?;
    let tenancy = source.get_tenancy().context("OCI connectivity check failed")?;
    writeln!(out, "✅ Tenancy: {}", tenancy.name)?;
    writeln!(
        out,
        "   Home region key: {}",
        tenancy.home_region_key.as_deref().unwrap_or("-")
    )?;
    writeln!(out, "   Region: {}", settings.region.as_deref().unwrap_or("-"))?;
    Ok(())
}
