//! Map a failed `oci` invocation onto [`CloudError`].
//!
//! Service failures are printed by the CLI as `ServiceError:` followed by a
//! JSON object carrying `status` and `code`. Client-side failures (network,
//! config) are plain text.

use serde::Deserialize;

use crate::error::CloudError;

const MAX_DETAIL_CHARS: usize = 400;

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

const TRANSIENT_MARKERS: &[&str] = &[
    "RequestException",
    "ConnectionError",
    "ConnectTimeout",
    "ReadTimeout",
    "Max retries exceeded",
    "Name or service not known",
    "Temporary failure in name resolution",
    "Connection reset",
];

const CLIENT_CONFIG_MARKERS: &[&str] = &[
    "ConfigFileNotFound",
    "Could not find config file",
    "ProfileNotFound",
    "InvalidConfig",
    "InvalidKeyFilePath",
    "MissingPrivateKeyPassphrase",
];

/// Classify a non-zero exit of `operation` from its stderr.
pub fn classify_failure(operation: &str, exit_code: i32, stderr: &str) -> CloudError {
    if let Some(service) = parse_service_error(stderr) {
        return classify_service_error(operation, &service);
    }
    let detail = truncate(stderr.trim());
    if TRANSIENT_MARKERS.iter().any(|m| stderr.contains(m)) {
        return CloudError::TransientIo(format!("{}: {}", operation, detail));
    }
    if CLIENT_CONFIG_MARKERS.iter().any(|m| stderr.contains(m)) {
        return CloudError::ClientUnavailable(format!("{}: {}", operation, detail));
    }
    CloudError::UnexpectedUpstream(format!(
        "{} exited with code {}: {}",
        operation, exit_code, detail
    ))
}

fn parse_service_error(stderr: &str) -> Option<ServiceError> {
    let start = stderr.find('{')?;
    let end = stderr.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&stderr[start..=end]).ok()
}

fn classify_service_error(operation: &str, e: &ServiceError) -> CloudError {
    let code = e.code.as_deref().unwrap_or("Unknown");
    let status = e.status.unwrap_or(-1);
    let detail = format!(
        "{} ({} {}): {}",
        operation,
        status,
        code,
        e.message.as_deref().unwrap_or("no message")
    );
    match (status, code) {
        (401 | 403, _) | (_, "NotAuthenticated" | "NotAuthorized" | "Forbidden") => {
            CloudError::Authorization(detail)
        }
        (404, _) => CloudError::ScopeNotFound(detail),
        (400, _) => CloudError::InvalidArgument(detail),
        (429, _) | (500..=599, _) | (-1, "RequestException") => CloudError::TransientIo(detail),
        _ => CloudError::UnexpectedUpstream(detail),
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_DETAIL_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(MAX_DETAIL_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_error(status: i64, code: &str) -> String {
        format!(
            "ServiceError:\n{{\n    \"code\": \"{}\",\n    \"message\": \"boom\",\n    \"opc-request-id\": \"abc\",\n    \"status\": {}\n}}\n",
            code, status
        )
    }

    #[test]
    fn test_service_error_statuses() {
        let op = "network vcn list";
        assert_eq!(
            classify_failure(op, 1, &service_error(401, "NotAuthenticated")).kind(),
            "AuthorizationError"
        );
        assert_eq!(
            classify_failure(op, 1, &service_error(404, "NotAuthorizedOrNotFound")).kind(),
            "ScopeNotFoundError"
        );
        assert_eq!(
            classify_failure(op, 1, &service_error(429, "TooManyRequests")).kind(),
            "TransientIOError"
        );
        assert_eq!(
            classify_failure(op, 1, &service_error(503, "ServiceUnavailable")).kind(),
            "TransientIOError"
        );
        assert_eq!(
            classify_failure(op, 1, &service_error(400, "InvalidParameter")).kind(),
            "InvalidArgumentError"
        );
        assert_eq!(
            classify_failure(op, 1, &service_error(409, "Conflict")).kind(),
            "UnexpectedUpstreamError"
        );
    }

    #[test]
    fn test_message_keeps_code_and_operation() {
        let e = classify_failure("iam tenancy get", 1, &service_error(404, "NotAuthorizedOrNotFound"));
        let msg = e.to_string();
        assert!(msg.contains("iam tenancy get"));
        assert!(msg.contains("NotAuthorizedOrNotFound"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_plain_text_failures() {
        let e = classify_failure(
            "compute instance list",
            1,
            "RequestException: Max retries exceeded with url: https://iaas...",
        );
        assert_eq!(e.kind(), "TransientIOError");

        let e = classify_failure("compute instance list", 1, "ERROR: Could not find config file at /x");
        assert_eq!(e.kind(), "ClientUnavailableError");

        let e = classify_failure("compute instance list", 2, "Usage: oci compute ...\nError: No such option");
        assert_eq!(e.kind(), "UnexpectedUpstreamError");
        assert!(e.to_string().contains("code 2"));
    }

    #[test]
    fn test_long_stderr_is_truncated() {
        let long = "x".repeat(2000);
        let msg = classify_failure("op", 1, &long).to_string();
        assert!(msg.len() < 600);
        assert!(msg.ends_with("..."));
    }
}
