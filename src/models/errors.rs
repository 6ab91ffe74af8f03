//! Centralized Error Handling Module
//!
//! Every failure surfaced by the Shield client flows through [`ShieldError`].
//! The UI only needs the human-readable message; the code is for logs and
//! for callers that want to branch (e.g. re-prompt login on `AUTH_ERROR`).
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - TRANSPORT / AUTH / VALIDATION / UPSTREAM: request failures
//! - DECODE: payload did not have the expected shape
//! - SESSION_xxx / NO_ACTIVE_SESSION: revoke workflow misuse
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Client-wide error type
#[derive(Debug)]
pub struct ShieldError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message, shown to the user as-is
    pub message: String,
    /// HTTP status when the failure came from a response
    pub status: Option<u16>,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ShieldError {
    /// Create a new ShieldError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Create ShieldError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Build the error for a non-2xx response.
    ///
    /// The body is expected to optionally carry `{"detail": ...}`. A string
    /// detail is surfaced verbatim, a FastAPI validation array is flattened
    /// to its `msg` entries. Anything else degrades to
    /// `Request failed (<status>)`.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|json| extract_detail(&json))
            .unwrap_or_else(|| format!("Request failed ({})", status));

        Self {
            code: ErrorCode::from_status(status),
            message,
            status: Some(status),
            source: None,
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

fn extract_detail(body: &serde_json::Value) -> Option<String> {
    match body.get("detail")? {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

impl fmt::Display for ShieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ShieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Request Errors
    // ============================================
    /// Network unreachable, connection refused, TLS failure
    Transport,
    /// Missing or expired credential (HTTP 401/403)
    Auth,
    /// Malformed input, rejected locally or by the server (4xx)
    Validation,
    /// Analysis engine failure (5xx)
    Upstream,
    /// Response body did not match the expected shape
    Decode,

    // ============================================
    // Revoke Workflow Errors
    // ============================================
    /// Approval index outside the scanned list
    SessionIndexOutOfRange,
    /// Revoke action attempted before any scan completed
    NoActiveSession,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "TRANSPORT_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Upstream => "UPSTREAM_ERROR",
            Self::Decode => "DECODE_ERROR",
            Self::SessionIndexOutOfRange => "SESSION_INDEX_OUT_OF_RANGE",
            Self::NoActiveSession => "NO_ACTIVE_SESSION",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
        }
    }

    /// Classify a non-2xx HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            400..=499 => Self::Validation,
            _ => Self::Upstream,
        }
    }

    /// Whether a caller-driven retry might succeed.
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport | Self::Upstream)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl ShieldError {
    /// Transport failure
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, msg)
    }

    /// Local or server-side validation failure
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, msg)
    }

    /// Unexpected payload shape
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Decode, msg)
    }

    /// Approval index outside the session
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::new(
            ErrorCode::SessionIndexOutOfRange,
            format!("Approval index {} out of range (session has {})", index, len),
        )
    }

    /// No scanned session to act on
    pub fn no_active_session() -> Self {
        Self::new(ErrorCode::NoActiveSession, "No scan results to act on")
    }

    /// Invalid configuration value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Client Result type
pub type ShieldResult<T> = Result<T, ShieldError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<reqwest::Error> for ShieldError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::with_source(ErrorCode::Decode, "Invalid response body", err)
        } else if err.is_timeout() {
            Self::with_source(ErrorCode::Transport, "Request timeout", err)
        } else if err.is_connect() {
            Self::with_source(ErrorCode::Transport, "Connection failed", err)
        } else {
            let message = err.to_string();
            Self::with_source(ErrorCode::Transport, message, err)
        }
    }
}

impl From<serde_json::Error> for ShieldError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::Decode, "JSON parse error", err)
    }
}
