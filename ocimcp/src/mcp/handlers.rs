//! MCP request handlers: initialize and the tool calls.
//!
//! Tool handlers return the JSON payload on success. Failures keep their
//! `CloudError` so the transport can report the kind to the caller.

use chrono::Utc;
use serde_json::{json, Value};

use ocimcp_cloud::exposure::public_instances;
use ocimcp_cloud::model::{CostQuery, CostSummary, InstanceAction, Scope};
use ocimcp_cloud::{CloudBackend, CloudError, Result};
use ocimcp_core::observability;

use super::state::McpServer;

pub(super) const PROTOCOL_VERSION: &str = "2024-11-05";

pub(super) fn handle_initialize(_params: &Value) -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": "oci-mcp-server",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Dispatch one `tools/call`.
pub(super) fn call_tool<B: CloudBackend>(
    server: &McpServer<B>,
    name: &str,
    arguments: &Value,
) -> Result<Value> {
    tracing::debug!(tool = name, "tools/call");
    match name {
        "list_compute_instances" => handle_list_compute_instances(server, arguments),
        "get_instance_details" => handle_get_instance_details(server, arguments),
        "instance_action" => handle_instance_action(server, arguments),
        "list_autonomous_databases" => handle_list_autonomous_databases(server, arguments),
        "list_storage_buckets" => handle_list_storage_buckets(server, arguments),
        "list_compartments" => handle_list_compartments(server),
        "list_public_instances" => handle_list_public_instances(server, arguments),
        "perform_security_assessment" => handle_perform_security_assessment(server, arguments),
        "get_tenancy_cost_summary" => handle_get_tenancy_cost_summary(server, arguments),
        _ => Err(CloudError::InvalidArgument(format!("unknown tool: {}", name))),
    }
}

fn optional_str<'a>(arguments: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(CloudError::InvalidArgument(format!(
            "{} must be a string, got {}",
            key, other
        ))),
    }
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str> {
    optional_str(arguments, key)?
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CloudError::InvalidArgument(format!("{} is required", key)))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| CloudError::UnexpectedUpstream(e.to_string()))
}

fn scope_arg<B: CloudBackend>(server: &McpServer<B>, arguments: &Value) -> Result<Scope> {
    server.scope_or_default(optional_str(arguments, "compartment_ocid")?)
}

fn handle_list_compute_instances<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let scope = scope_arg(server, arguments)?;
    let state = optional_str(arguments, "lifecycle_state")?
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let mut instances = server.backend.list_instances(&scope)?;
    if let Some(state) = state {
        instances.retain(|i| i.lifecycle_state.eq_ignore_ascii_case(state));
    }
    to_value(&instances)
}

fn handle_get_instance_details<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let instance_id = required_str(arguments, "instance_id")?;
    to_value(&server.backend.get_instance(instance_id)?)
}

fn handle_instance_action<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let instance_id = required_str(arguments, "instance_id")?;
    let action: InstanceAction = required_str(arguments, "action")?.parse()?;

    match server.backend.instance_action(instance_id, action) {
        Ok(receipt) => {
            observability::audit_instance_action(instance_id, action.as_str(), Ok(receipt.lifecycle_state.as_str()));
            to_value(&receipt)
        }
        Err(e) => {
            observability::audit_instance_action(instance_id, action.as_str(), Err(e.kind()));
            Err(e)
        }
    }
}

fn handle_list_autonomous_databases<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let scope = scope_arg(server, arguments)?;
    to_value(&server.backend.list_autonomous_databases(&scope)?)
}

fn handle_list_storage_buckets<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let scope = scope_arg(server, arguments)?;
    to_value(&server.backend.list_buckets(&scope)?)
}

fn handle_list_compartments<B: CloudBackend>(server: &McpServer<B>) -> Result<Value> {
    to_value(&server.backend.list_compartments()?)
}

fn handle_list_public_instances<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let scope = scope_arg(server, arguments)?;
    to_value(&public_instances(&server.backend, &scope)?)
}

fn handle_perform_security_assessment<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let requested = Scope::from_optional(optional_str(arguments, "compartment_ocid")?);
    let requested_label: Vec<String> = requested.iter().map(|s| s.to_string()).collect();

    match server.evaluator().run(requested) {
        Ok(assessment) => {
            let scopes: Vec<String> = assessment.scopes.iter().map(|s| s.to_string()).collect();
            observability::audit_assessment(&scopes, assessment.findings.len(), None);
            Ok(json!({
                "scopes": scopes,
                "finding_count": assessment.findings.len(),
                "findings": to_value(&assessment.findings)?,
            }))
        }
        Err(e) => {
            observability::audit_assessment(&requested_label, 0, Some(e.kind()));
            Err(e)
        }
    }
}

fn handle_get_tenancy_cost_summary<B: CloudBackend>(
    server: &McpServer<B>,
    arguments: &Value,
) -> Result<Value> {
    let query = CostQuery::from_iso(
        optional_str(arguments, "start_time_iso")?,
        optional_str(arguments, "end_time_iso")?,
        optional_str(arguments, "granularity")?,
        Utc::now(),
    )?;
    let items = server.backend.summarize_costs(&query)?;
    to_value(&CostSummary::from_items(&query, items))
}
