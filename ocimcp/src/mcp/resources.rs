//! MCP resources and prompts.

use serde_json::{json, Value};

use ocimcp_cloud::{CloudBackend, CloudError, Result};

use super::state::McpServer;

pub(super) const COMPARTMENTS_URI: &str = "oci://compartments";
pub(super) const ANALYSIS_PROMPT: &str = "oci_analysis_prompt";

const ANALYSIS_PROMPT_TEXT: &str = "You are an expert Oracle Cloud architect. Given the JSON output of tools \
such as `list_compute_instances`, `list_public_instances`, `perform_security_assessment` and \
`get_tenancy_cost_summary`, write a concise assessment covering security, cost and reliability. \
Call out risky public exposure and ingress rules open to any source, suggest least-privilege \
hardening, recommend cost optimizations such as stopping idle instances or enabling Autonomous \
Database auto-scaling, and note missing monitoring or alerting.";

pub(super) fn list_resources() -> Value {
    json!({
        "resources": [{
            "uri": COMPARTMENTS_URI,
            "name": "compartments",
            "description": "Accessible compartments in the tenancy (id, name, state)",
            "mimeType": "application/json"
        }]
    })
}

pub(super) fn read_resource<B: CloudBackend>(server: &McpServer<B>, params: &Value) -> Result<Value> {
    let uri = params.get("uri").and_then(|u| u.as_str()).unwrap_or("");
    if uri != COMPARTMENTS_URI {
        return Err(CloudError::InvalidArgument(format!("unknown resource: {}", uri)));
    }
    let compartments = server.backend.list_compartments()?;
    let text = serde_json::to_string_pretty(&json!({ "compartments": compartments }))
        .map_err(|e| CloudError::UnexpectedUpstream(e.to_string()))?;
    Ok(json!({
        "contents": [{
            "uri": COMPARTMENTS_URI,
            "mimeType": "application/json",
            "text": text
        }]
    }))
}

pub(super) fn list_prompts() -> Value {
    json!({
        "prompts": [{
            "name": ANALYSIS_PROMPT,
            "description": "Analyze OCI state returned by the tools",
            "arguments": []
        }]
    })
}

pub(super) fn get_prompt(params: &Value) -> Option<Value> {
    let name = params.get("name").and_then(|n| n.as_str())?;
    if name != ANALYSIS_PROMPT {
        return None;
    }
    Some(json!({
        "description": "Analyze OCI state returned by the tools",
        "messages": [{
            "role": "user",
            "content": {"type": "text", "text": ANALYSIS_PROMPT_TEXT}
        }]
    }))
}
