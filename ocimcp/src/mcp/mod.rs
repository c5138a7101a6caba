//! MCP (Model Context Protocol) server.
//!
//! JSON-RPC 2.0 over stdio, one message per line. stdout carries protocol
//! frames only; logging goes to stderr.
//!
//! Protocol flow:
//!   1. Client sends `initialize` → server returns capabilities
//!   2. Client sends `notifications/initialized`
//!   3. Client sends `tools/list` → server returns the tool definitions
//!   4. Client sends `tools/call` → server runs the tool, returns the result
//!
//! A failed tool call is a normal result with `isError: true` and a
//! structured `{"error": {"kind", "message"}}` body, so "no findings" and
//! "evaluation failed" can never be confused.

mod handlers;
mod resources;
mod state;
mod tools;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::{self, BufRead, BufReader, Write};

use ocimcp_cloud::{CloudBackend, CloudError, OciCli};
use ocimcp_core::config::OciSettings;

use handlers::{call_tool, handle_initialize};
use state::McpServer;
use tools::get_mcp_tools;

/// Maximum JSON-RPC request size (4 MiB).
const MAX_REQUEST_SIZE: usize = 4 * 1024 * 1024;

/// Read one line from `reader`, enforcing [`MAX_REQUEST_SIZE`].
/// `Ok(None)` on EOF. An oversized line is discarded up to its newline and
/// reported as `InvalidData`, leaving the reader at the next message.
fn read_line_limited(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    loop {
        let available = match reader.fill_buf() {
            Ok(b) => b,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return if buf.is_empty() { Ok(None) } else { finish_line(buf).map(Some) };
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if buf.len() + pos > MAX_REQUEST_SIZE {
                    reader.consume(pos + 1);
                    return Err(oversize());
                }
                buf.extend_from_slice(&available[..pos]);
                reader.consume(pos + 1);
                return finish_line(buf).map(Some);
            }
            None => {
                let len = available.len();
                if buf.len() + len > MAX_REQUEST_SIZE {
                    reader.consume(len);
                    skip_until_newline(reader);
                    return Err(oversize());
                }
                buf.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}

fn finish_line(mut buf: Vec<u8>) -> io::Result<String> {
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid UTF-8"))
}

fn oversize() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "request exceeds 4 MiB size limit")
}

/// Discard bytes until a newline or EOF without buffering them.
fn skip_until_newline(reader: &mut impl BufRead) {
    loop {
        match reader.fill_buf() {
            Ok(b) if b.is_empty() => break,
            Ok(b) => {
                if let Some(pos) = b.iter().position(|&c| c == b'\n') {
                    reader.consume(pos + 1);
                    break;
                }
                let len = b.len();
                reader.consume(len);
            }
            Err(_) => break,
        }
    }
}

/// Run the MCP server on stdin/stdout against the `oci` CLI backend.
///
/// This is the entry point for `ocimcp serve`.
pub fn serve_mcp_stdio(settings: &OciSettings) -> Result<()> {
    tracing::info!(
        auth = settings.credentials.label(),
        region = settings.region.as_deref().unwrap_or("-"),
        "starting MCP server on stdio"
    );
    let server = McpServer::new(OciCli::new(settings.clone()), settings);
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&server, BufReader::new(stdin.lock()), stdout.lock())
}

/// Serve requests from `reader` until EOF.
fn serve<B: CloudBackend>(server: &McpServer<B>, mut reader: impl BufRead, mut out: impl Write) -> Result<()> {
    loop {
        let line = match read_line_limited(&mut reader) {
            Ok(None) => break,
            Ok(Some(l)) => l,
            Err(e) => {
                tracing::warn!("rejected request: {}", e);
                let err = json!({"code": -32600, "message": format!("Request size error: {}", e)});
                send_response(&mut out, None, Err(err))?;
                continue;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                let err = json!({"code": -32700, "message": format!("Parse error: {}", e)});
                send_response(&mut out, None, Err(err))?;
                continue;
            }
        };

        let id = request.get("id").cloned();
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or(json!({}));

        match method {
            // ─── Lifecycle ──────────────────────────────────────────────
            "initialize" => {
                send_response(&mut out, id, Ok(handle_initialize(&params)))?;
            }
            "notifications/initialized" | "initialized" => {}
            "ping" => {
                send_response(&mut out, id, Ok(json!({})))?;
            }

            // ─── Tools ─────────────────────────────────────────────────
            "tools/list" => {
                send_response(&mut out, id, Ok(json!({ "tools": get_mcp_tools() })))?;
            }
            "tools/call" => {
                let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
                let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
                let result = call_tool(server, tool_name, &arguments);
                send_response(&mut out, id, Ok(tool_result(tool_name, result)))?;
            }

            // ─── Resources / Prompts ────────────────────────────────────
            "resources/list" => {
                send_response(&mut out, id, Ok(resources::list_resources()))?;
            }
            "resources/read" => {
                let result = resources::read_resource(server, &params).map_err(|e| rpc_error(&e));
                send_response(&mut out, id, result)?;
            }
            "prompts/list" => {
                send_response(&mut out, id, Ok(resources::list_prompts()))?;
            }
            "prompts/get" => {
                let result = resources::get_prompt(&params).ok_or_else(|| {
                    json!({"code": -32602, "message": "Unknown prompt"})
                });
                send_response(&mut out, id, result)?;
            }

            // ─── Unknown ────────────────────────────────────────────────
            _ => {
                if id.is_some() {
                    let err = json!({
                        "code": -32601,
                        "message": format!("Method not found: {}", method)
                    });
                    send_response(&mut out, id, Err(err))?;
                }
            }
        }
    }
    tracing::info!("stdin closed; MCP server exiting");
    Ok(())
}

/// Wrap a tool outcome as MCP `CallToolResult`.
fn tool_result(tool: &str, result: ocimcp_cloud::Result<Value>) -> Value {
    match result {
        Ok(payload) => {
            let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
            json!({
                "content": [{"type": "text", "text": text}],
                "isError": false
            })
        }
        Err(e) => {
            tracing::warn!(tool, kind = e.kind(), "tool failed: {}", e);
            let body = json!({"error": {"kind": e.kind(), "message": e.to_string()}});
            json!({
                "content": [{"type": "text", "text": body.to_string()}],
                "structuredContent": body,
                "isError": true
            })
        }
    }
}

fn rpc_error(e: &CloudError) -> Value {
    let code = match e {
        CloudError::InvalidArgument(_) => -32602,
        _ => -32603,
    };
    json!({"code": code, "message": e.to_string(), "data": {"kind": e.kind()}})
}

/// Send a JSON-RPC 2.0 response.
fn send_response(out: &mut impl Write, id: Option<Value>, result: Result<Value, Value>) -> Result<()> {
    let id = id.unwrap_or(Value::Null);
    let resp = match result {
        Ok(res) => json!({"jsonrpc": "2.0", "id": id, "result": res}),
        Err(err) => json!({"jsonrpc": "2.0", "id": id, "error": err}),
    };
    writeln!(out, "{}", resp).context("write to MCP client")?;
    out.flush().context("flush MCP client")?;
    Ok(())
}
