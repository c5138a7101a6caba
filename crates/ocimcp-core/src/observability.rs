//! Observability: tracing init and the JSONL audit log.
//!
//! Uses config::ObservabilityConfig for OCIMCP_QUIET, OCIMCP_LOG_LEVEL,
//! OCIMCP_LOG_JSON and OCIMCP_AUDIT_LOG.
//!
//! stdout belongs to the MCP transport, so every log line goes to stderr.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

static AUDIT_PATH: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Initialize tracing. Call once at process startup.
/// `RUST_LOG` wins; otherwise OCIMCP_LOG_LEVEL, lowered to warn by OCIMCP_QUIET=1.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

fn get_audit_path() -> Option<PathBuf> {
    {
        let guard = AUDIT_PATH.lock().ok()?;
        if let Some(ref p) = *guard {
            return Some(p.clone());
        }
    }
    let path = PathBuf::from(crate::config::ObservabilityConfig::from_env().audit_log?);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    {
        let mut guard = AUDIT_PATH.lock().ok()?;
        *guard = Some(path.clone());
    }
    Some(path)
}

fn append_jsonl(path: &Path, record: &serde_json::Value) {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(mut f) => {
            if let Ok(line) = serde_json::to_string(record) {
                let _ = writeln!(f, "{}", line);
            }
        }
        Err(e) => tracing::warn!(path = %path.display(), "audit log unavailable: {}", e),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn instance_action_record(
    instance_id: &str,
    action: &str,
    outcome: Result<&str, &str>,
) -> serde_json::Value {
    json!({
        "ts": timestamp(),
        "event": "instance_action",
        "instance_id": instance_id,
        "action": action,
        "success": outcome.is_ok(),
        "lifecycle_state": outcome.ok(),
        "error_kind": outcome.err(),
    })
}

fn assessment_record(scopes: &[String], findings: usize, error_kind: Option<&str>) -> serde_json::Value {
    json!({
        "ts": timestamp(),
        "event": "security_assessment",
        "scopes": scopes,
        "findings": findings,
        "success": error_kind.is_none(),
        "error_kind": error_kind,
    })
}

/// Audit: an instance state transition was requested. `outcome` carries the
/// upstream lifecycle state on success, the error kind on failure.
pub fn audit_instance_action(instance_id: &str, action: &str, outcome: Result<&str, &str>) {
    match outcome {
        Ok(state) => tracing::info!(
            instance_id = %instance_id,
            action = %action,
            lifecycle_state = %state,
            "instance action"
        ),
        Err(kind) => tracing::warn!(
            instance_id = %instance_id,
            action = %action,
            error_kind = %kind,
            "instance action failed"
        ),
    }
    if let Some(path) = get_audit_path() {
        append_jsonl(&path, &instance_action_record(instance_id, action, outcome));
    }
}

/// Audit: a security assessment finished (successfully or not).
pub fn audit_assessment(scopes: &[String], findings: usize, error_kind: Option<&str>) {
    if let Some(path) = get_audit_path() {
        append_jsonl(&path, &assessment_record(scopes, findings, error_kind));
    }
}
