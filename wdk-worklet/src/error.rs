//! Error classification at the RPC boundary.
//!
//! Nothing crosses the wire unshaped: every failure — from the manager, a
//! backend, or the adapter's own normalization — is folded into an
//! [`ErrorPayload`] carrying a code from the closed taxonomy, a message, and
//! the stringified original cause.

use serde::{Deserialize, Serialize};

use wdk_core::Error as CoreError;

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, WorkletError>;

/// Failures of the adapter itself (as opposed to dispatched operations).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WorkletError {
    /// Reading from or writing to the transport failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be serialized.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Enumeration of all wire error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unclassified failure.
    Unknown,
    /// The request payload itself was malformed (bad numerics, bad JSON).
    BadRequest,
    /// No manager is live: `workletStart` has not run, or construction
    /// failed.
    WdkManagerInit,
    /// Blockchain identifier outside the supported set.
    UnsupportedBlockchain,
    /// Chain known but lacks the requested variant or method.
    UnsupportedCapability,
    /// Operation restricted to a specific chain, invoked for another.
    UnsupportedOperation,
    /// Missing per-chain seed or configuration entry.
    Configuration,
    /// No backend registered for the chain/variant pair.
    BackendLoad,
    /// The backend's own call failed.
    BackendCall,
    /// Operation attempted after teardown.
    Disposed,
}

/// The structured error shape every failed request returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error code from the closed taxonomy.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// The original cause, stringified with its source chain.
    pub error: String,
}

impl ErrorPayload {
    /// Build a payload with an explicit code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            error: message.clone(),
            code,
            message,
        }
    }

    /// Build a `BAD_REQUEST` payload for a malformed field.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }
}

impl From<CoreError> for ErrorPayload {
    fn from(err: CoreError) -> Self {
        let code = classify(&err);
        Self {
            code,
            message: err.to_string(),
            error: stringify_error(&err),
        }
    }
}

/// Map a core error onto its wire code.
#[must_use]
pub fn classify(err: &CoreError) -> ErrorCode {
    match err {
        CoreError::UnsupportedBlockchain { .. } => ErrorCode::UnsupportedBlockchain,
        CoreError::UnsupportedCapability { .. } => ErrorCode::UnsupportedCapability,
        CoreError::UnsupportedOperation { .. } => ErrorCode::UnsupportedOperation,
        CoreError::Configuration(_) => ErrorCode::Configuration,
        CoreError::BackendLoad { .. } => ErrorCode::BackendLoad,
        CoreError::Backend(_) => ErrorCode::BackendCall,
        CoreError::Disposed => ErrorCode::Disposed,
        _ => ErrorCode::Unknown,
    }
}

/// Render an error together with its source chain.
#[must_use]
pub fn stringify_error(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
