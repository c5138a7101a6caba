//! ocimcp: an MCP server exposing Oracle Cloud Infrastructure to AI assistants.

mod cli;
mod commands;
mod mcp;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use cli::{Cli, Commands};
use ocimcp_core::config::{self, OciSettings, SettingsOverrides};

fn load_settings(cli: &Cli) -> Result<OciSettings> {
    let overrides = SettingsOverrides {
        config_file: cli.config_file.clone(),
        profile: cli.profile.clone(),
        timeout: cli.timeout.map(Duration::from_secs),
    };
    OciSettings::load(&overrides).context("Failed to load OCI settings")
}

/// Run the CLI: parse args and dispatch to command handlers.
pub fn run_cli() -> Result<()> {
    // Before parsing, so `.env` values reach clap's `env` fallbacks.
    config::load_dotenv();
    let cli = Cli::parse();
    ocimcp_core::observability::init_tracing();

    match cli.command {
        None | Some(Commands::Serve) => {
            let settings = load_settings(&cli)?;
            mcp::serve_mcp_stdio(&settings)?;
        }
        Some(Commands::Check) => {
            let settings = load_settings(&cli)?;
            commands::check::cmd_check(&settings)?;
        }
        Some(Commands::Assess { ref compartment, json }) => {
            let settings = load_settings(&cli)?;
            commands::assess::cmd_assess(&settings, compartment.as_deref(), json)?;
        }
        Some(Commands::Install {
            host,
            ref project_dir,
            global,
            force,
        }) => {
            commands::install::cmd_install(
                host,
                project_dir.as_deref(),
                global,
                force,
                cli.profile.as_deref(),
                cli.config_file.as_deref(),
            )?;
        }
    }
    Ok(())
}
