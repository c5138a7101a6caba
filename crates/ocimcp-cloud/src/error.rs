//! Error taxonomy for calls against the cloud read/action interfaces.

use std::time::Duration;

use thiserror::Error;

/// Every failure from the read or action interface, with its kind preserved.
///
/// The evaluator and tool handlers never convert these into empty results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("scope not found: {0}")]
    ScopeNotFound(String),

    #[error("transient I/O failure: {0}")]
    TransientIo(String),

    #[error("'{operation}' timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    #[error("unexpected upstream response: {0}")]
    UnexpectedUpstream(String),

    #[error("cloud client unavailable: {0}")]
    ClientUnavailable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CloudError {
    /// Stable label surfaced to MCP callers.
    pub fn kind(&self) -> &'static str {
        match self {
            CloudError::Authorization(_) => "AuthorizationError",
            CloudError::ScopeNotFound(_) => "ScopeNotFoundError",
            CloudError::TransientIo(_) => "TransientIOError",
            CloudError::Timeout { .. } => "TimeoutError",
            CloudError::UnexpectedUpstream(_) => "UnexpectedUpstreamError",
            CloudError::ClientUnavailable(_) => "ClientUnavailableError",
            CloudError::InvalidArgument(_) => "InvalidArgumentError",
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_and_kind() {
        let e = CloudError::Timeout {
            operation: "network vcn list".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(e.kind(), "TimeoutError");
        assert_eq!(e.to_string(), "'network vcn list' timed out after 30s");
    }
}
