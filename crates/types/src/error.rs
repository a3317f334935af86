use alloy_primitives::U256;
use thiserror::Error;

/// Error surfaced by an external capability (signer, submitter, relay, transaction
/// builder). Capabilities map their native errors into this shape so failures can be
/// classified without string matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// The user dismissed the wallet prompt
    #[error("user rejected the request")]
    UserRejected,

    /// The wallet prompt timed out waiting for the user
    #[error("signing request timed out")]
    SigningTimeout,

    /// A backend or relay rejected the request with a structured reason
    #[error("backend rejected request{}: {detail}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Backend {
        status: Option<u16>,
        code: Option<String>,
        detail: String,
    },

    /// The network entry point could not be reached or refused the broadcast
    #[error("network error: {0}")]
    Network(String),

    /// The on-chain allowance no longer matches what was planned
    #[error("allowance mismatch: expected {expected}, observed {observed}")]
    AllowanceMismatch { expected: U256, observed: U256 },

    /// The transaction was included but reverted
    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("{message}")]
    Other { code: Option<i64>, message: String },
}

impl CapabilityError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: None,
            message: message.into(),
        }
    }

    pub fn backend(detail: impl Into<String>) -> Self {
        Self::Backend {
            status: None,
            code: None,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_display() {
        let err = CapabilityError::Backend {
            status: Some(400),
            code: Some("QUOTE_EXPIRED".to_string()),
            detail: "quote expired".to_string(),
        };
        assert_eq!(err.to_string(), "backend rejected request (status 400): quote expired");
        assert_eq!(
            CapabilityError::backend("nope").to_string(),
            "backend rejected request: nope"
        );
    }
}
