//! Host integration: register the server under `mcpServers.oci`.
//!
//! Existing host config is merged, never clobbered: other servers and
//! unrelated keys are kept, and only the `oci` entry is replaced.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::Host;

pub const SERVER_KEY: &str = "oci";

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{path} is not valid JSON ({reason}); rerun with --force to replace it")]
    Unparseable { path: PathBuf, reason: String },

    #[error("{path} does not hold a JSON object; rerun with --force to replace it")]
    NotAnObject { path: PathBuf },
}

/// Config file the host reads MCP servers from.
pub fn config_path(host: Host, project: &Path, global: bool) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    match (host, global) {
        (Host::Claude, false) => project.join(".mcp.json"),
        (Host::Claude, true) => dirs::config_dir()
            .unwrap_or_else(|| home().join(".config"))
            .join("Claude")
            .join("claude_desktop_config.json"),
        (Host::Cursor, false) => project.join(".cursor").join("mcp.json"),
        (Host::Cursor, true) => home().join(".cursor").join("mcp.json"),
    }
}

/// The `mcpServers.oci` entry: this binary with `serve`, plus the profile
/// and config file when they were chosen explicitly.
pub fn server_entry(command: &str, profile: Option<&str>, config_file: Option<&Path>) -> Value {
    let mut env = Map::new();
    if let Some(p) = profile {
        env.insert("OCI_CONFIG_PROFILE".into(), json!(p));
    }
    if let Some(f) = config_file {
        env.insert("OCI_CONFIG_FILE".into(), json!(f.to_string_lossy()));
    }
    let mut entry = json!({
        "command": command,
        "args": ["serve"],
    });
    if !env.is_empty() {
        entry["env"] = Value::Object(env);
    }
    entry
}

/// Merge `entry` into `existing` (raw file content, if any).
pub fn merge_config(
    path: &Path,
    existing: Option<&str>,
    entry: Value,
    force: bool,
) -> Result<Value, InstallError> {
    let mut root = match existing.map(str::trim).filter(|s| !s.is_empty()) {
        None => json!({}),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(v @ Value::Object(_)) => v,
            Ok(_) if force => json!({}),
            Ok(_) => return Err(InstallError::NotAnObject { path: path.to_path_buf() }),
            Err(_) if force => json!({}),
            Err(e) => {
                return Err(InstallError::Unparseable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        },
    };
    if !root.get("mcpServers").is_some_and(Value::is_object) {
        root["mcpServers"] = json!({});
    }
    root["mcpServers"][SERVER_KEY] = entry;
    Ok(root)
}

/// `ocimcp install <host>`
pub fn cmd_install(
    host: Host,
    project_dir: Option<&Path>,
    global: bool,
    force: bool,
    profile: Option<&str>,
    config_file: Option<&Path>,
) -> Result<()> {
    let project = project_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let command = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "ocimcp".to_string());

    let path = config_path(host, &project, global);
    let entry = server_entry(&command, profile, config_file);
    install_at(&path, entry, force)?;

    eprintln!("✓ Registered MCP server '{}' in {}", SERVER_KEY, path.display());
    eprintln!("   → {} serve", command);
    eprintln!("Restart {:?} to pick up the new server.", host);
    Ok(())
}

fn install_at(path: &Path, entry: Value, force: bool) -> Result<()> {
    let existing = if path.exists() {
        Some(fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?)
    } else {
        None
    };
    let merged = merge_config(path, existing.as_deref(), entry, force)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, serde_json::to_string_pretty(&merged)? + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "host config updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_other_servers() {
        let existing = r#"{"theme": "dark", "mcpServers": {"git": {"command": "git-mcp"}, "oci": {"command": "old"}}}"#;
        let merged = merge_config(
            Path::new("x.json"),
            Some(existing),
            server_entry("/usr/local/bin/ocimcp", None, None),
            false,
        )
        .unwrap();
        assert_eq!(merged["theme"], "dark");
        assert_eq!(merged["mcpServers"]["git"]["command"], "git-mcp");
        assert_eq!(merged["mcpServers"]["oci"]["command"], "/usr/local/bin/ocimcp");
        assert_eq!(merged["mcpServers"]["oci"]["args"], json!(["serve"]));
        assert!(merged["mcpServers"]["oci"].get("env").is_none());
    }

    #[test]
    fn test_bad_existing_config_needs_force() {
        let entry = server_entry("ocimcp", Some("PROD"), None);
        let err = merge_config(Path::new("c.json"), Some("{oops"), entry.clone(), false).unwrap_err();
        assert!(matches!(err, InstallError::Unparseable { .. }));
        let err = merge_config(Path::new("c.json"), Some("[1,2]"), entry.clone(), false).unwrap_err();
        assert!(matches!(err, InstallError::NotAnObject { .. }));

        let merged = merge_config(Path::new("c.json"), Some("{oops"), entry, true).unwrap();
        assert_eq!(merged["mcpServers"]["oci"]["env"]["OCI_CONFIG_PROFILE"], "PROD");
    }

    #[test]
    fn test_install_writes_project_cursor_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(Host::Cursor, dir.path(), false);
        assert!(path.ends_with(".cursor/mcp.json"));

        install_at(&path, server_entry("ocimcp", None, None), false).unwrap();
        fs::write(
            &path,
            r#"{"mcpServers": {"other": {"command": "x"}, "oci": {"command": "stale"}}}"#,
        )
        .unwrap();
        install_at(&path, server_entry("ocimcp", None, Some(Path::new("/etc/oci/config"))), false).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["mcpServers"]["other"]["command"], "x");
        assert_eq!(written["mcpServers"]["oci"]["command"], "ocimcp");
        assert_eq!(written["mcpServers"]["oci"]["env"]["OCI_CONFIG_FILE"], "/etc/oci/config");
    }

    #[test]
    fn test_claude_project_path() {
        let p = config_path(Host::Claude, Path::new("/work/app"), false);
        assert_eq!(p, PathBuf::from("/work/app/.mcp.json"));
    }
}
