//! MCP tool definitions.

use serde_json::{json, Value};

fn compartment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "compartment_ocid": {
                "type": "string",
                "description": "Compartment OCID (defaults to DEFAULT_COMPARTMENT_OCID or the tenancy)"
            }
        },
        "required": []
    })
}

pub(super) fn get_mcp_tools() -> Vec<Value> {
    vec![
        json!({
            "name": "list_compute_instances",
            "description": "List compute instances in a compartment, optionally filtered by lifecycle state (RUNNING, STOPPED, ...).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "compartment_ocid": {
                        "type": "string",
                        "description": "Compartment OCID (defaults to DEFAULT_COMPARTMENT_OCID or the tenancy)"
                    },
                    "lifecycle_state": {
                        "type": "string",
                        "description": "Only return instances in this state (case-insensitive)"
                    }
                },
                "required": []
            }
        }),
        json!({
            "name": "get_instance_details",
            "description": "Get one compute instance with its metadata and attached VNICs (private/public IPs).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "instance_id": {
                        "type": "string",
                        "description": "Instance OCID"
                    }
                },
                "required": ["instance_id"]
            }
        }),
        json!({
            "name": "instance_action",
            "description": "Change an instance's power state. This modifies cloud resources: confirm with the user before calling.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "instance_id": {
                        "type": "string",
                        "description": "Instance OCID"
                    },
                    "action": {
                        "type": "string",
                        "description": "One of START, STOP, RESET, SOFTRESET, SOFTSTOP",
                        "enum": ["START", "STOP", "RESET", "SOFTRESET", "SOFTSTOP"]
                    }
                },
                "required": ["instance_id", "action"]
            }
        }),
        json!({
            "name": "list_autonomous_databases",
            "description": "List Autonomous Databases in a compartment.",
            "inputSchema": compartment_schema()
        }),
        json!({
            "name": "list_storage_buckets",
            "description": "List Object Storage buckets in a compartment, with the tenancy namespace.",
            "inputSchema": compartment_schema()
        }),
        json!({
            "name": "list_compartments",
            "description": "List every accessible compartment in the tenancy.",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "required": []
            }
        }),
        json!({
            "name": "list_public_instances",
            "description": "List instances that have a public IP on any attached VNIC.",
            "inputSchema": compartment_schema()
        }),
        json!({
            "name": "perform_security_assessment",
            "description": "Read-only check for security list and network security group ingress rules open to any source (0.0.0.0/0 or ::/0). Returns HIGH findings; an empty list means no such rule was found. Not a complete audit.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "compartment_ocid": {
                        "type": "string",
                        "description": "Compartment OCID (defaults to DEFAULT_COMPARTMENT_OCID, the tenancy, or every accessible compartment)"
                    }
                },
                "required": []
            }
        }),
        json!({
            "name": "get_tenancy_cost_summary",
            "description": "Summarize tenancy cost per service from the Usage API. Defaults to the last 7 days at DAILY granularity.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "start_time_iso": {
                        "type": "string",
                        "description": "ISO-8601 start (default: end minus 7 days)"
                    },
                    "end_time_iso": {
                        "type": "string",
                        "description": "ISO-8601 end (default: now)"
                    },
                    "granularity": {
                        "type": "string",
                        "default": "DAILY",
                        "enum": ["DAILY", "MONTHLY"]
                    }
                },
                "required": []
            }
        }),
    ]
}
