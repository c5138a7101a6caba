use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// ocimcp - Oracle Cloud Infrastructure tools for MCP clients
#[derive(Parser, Debug)]
#[command(name = "ocimcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Timeout for each `oci` call in seconds (default: from env or 60)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// OCI config profile
    #[arg(long, global = true, env = "OCI_CONFIG_PROFILE", value_name = "NAME")]
    pub profile: Option<String>,

    /// OCI config file (default: ~/.oci/config)
    #[arg(long, global = true, env = "OCI_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server over stdio (default)
    Serve,

    /// Verify credentials by fetching the tenancy
    Check,

    /// Report ingress rules open to any source
    ///
    /// Examples:
    ///   ocimcp assess
    ///   ocimcp assess --compartment ocid1.compartment.oc1..xxxx --json
    Assess {
        /// Compartment OCID (default: DEFAULT_COMPARTMENT_OCID, then tenancy)
        #[arg(long, short = 'c')]
        compartment: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register this server with an MCP host (writes mcpServers.oci)
    Install {
        /// Host application
        #[arg(value_enum)]
        host: Host,

        /// Project directory (default: current directory)
        #[arg(long, short = 'p')]
        project_dir: Option<PathBuf>,

        /// Write the user-level config instead of the project one
        #[arg(long, short = 'g')]
        global: bool,

        /// Replace an unreadable existing config instead of failing
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Host {
    Claude,
    Cursor,
}
