//! Error types for the coach gateway

/// Failure of a single Gateway call.
///
/// Every public Gateway operation ends in exactly one value or exactly one of
/// these kinds. The kind is preserved for callers so they can tell "service is
/// down" from "bad input" from "service bug".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Client error {status}: {body}")]
    ClientError { status: u16, body: String },

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// HTTP status carried by the error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::ClientError { status, .. } | GatewayError::ServerError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The backend could not be talked to; retry later / show the offline banner
    pub fn is_service_down(&self) -> bool {
        matches!(
            self,
            GatewayError::Unreachable(_) | GatewayError::Timeout(_)
        )
    }

    /// The request itself was rejected; the user can fix the input and resubmit
    pub fn is_user_fixable(&self) -> bool {
        matches!(self, GatewayError::ClientError { .. })
    }

    /// Translate a non-success status into the matching error kind.
    ///
    /// The body is kept verbatim for diagnostics and never decoded.
    pub fn from_status(status: u16, body: String) -> Self {
        if status >= 500 {
            GatewayError::ServerError { status, body }
        } else if status >= 400 {
            GatewayError::ClientError { status, body }
        } else {
            GatewayError::MalformedResponse(format!("unexpected status {}", status))
        }
    }
}

/// Errors raised while assembling the gateway (config, HTTP client setup)
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport setup failed: {0}")]
    Transport(String),
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
