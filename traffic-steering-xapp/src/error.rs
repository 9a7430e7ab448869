//! Structured errors raised by the xApp.
//!
//! Every failure site builds an [`XAppError`] around a [`Cause`]. The cause
//! decides whether the failure is worth retrying; the error adds the code,
//! the dispatch type code and the process correlation id.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

pub const COMPONENT: &str = "TrafficSteeringXApp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    E2ParseFailed,
    UnknownMessageType,
    A1ParseFailed,
    A1ValidationFailed,
    ControlRequestFailed,
    Cancelled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2ParseFailed => "E2_PARSE_FAILED",
            ErrorCode::UnknownMessageType => "UNKNOWN_MESSAGE_TYPE",
            ErrorCode::A1ParseFailed => "A1_PARSE_FAILED",
            ErrorCode::A1ValidationFailed => "A1_VALIDATION_FAILED",
            ErrorCode::ControlRequestFailed => "CONTROL_REQUEST_FAILED",
            ErrorCode::Cancelled => "CANCELLED",
        }
    }

    /// Client-side failures (bad bytes, bad policy, unknown type) as opposed
    /// to failures of the xApp itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2ParseFailed
                | ErrorCode::UnknownMessageType
                | ErrorCode::A1ParseFailed
                | ErrorCode::A1ValidationFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying reason of a failure.
#[derive(Debug, Error)]
pub enum Cause {
    #[error("indication payload too short: {len} bytes, need at least {min}")]
    PayloadTooShort { len: usize, min: usize },
    #[error("malformed policy document: {0}")]
    MalformedPolicy(serde_json::Error),
    #[error("policy ID is required")]
    MissingPolicyId,
    #[error("policy type is required")]
    MissingPolicyType,
    #[error("policy expired at {0}")]
    PolicyExpired(OffsetDateTime),
    #[error("unknown message type: {0}")]
    UnknownMessageType(u32),
    #[error("failed to encode control request: {0}")]
    Encode(serde_json::Error),
    #[error("control endpoint unavailable: {0}")]
    ControlUnavailable(String),
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("operation cancelled")]
    Cancelled,
}

impl Cause {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Cause::ControlUnavailable(_) | Cause::Timeout(_))
    }

    /// Terminal causes end the whole operation, whatever code the caller
    /// wanted to report.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Cause::Cancelled | Cause::DeadlineExceeded(_))
    }
}

#[derive(Debug, Error)]
#[error("[{code}] {component}: {message} (msg_type: {message_type}, correlation: {correlation_id}) - {cause}")]
pub struct XAppError {
    pub code: ErrorCode,
    pub message: String,
    pub component: &'static str,
    pub message_type: u32,
    pub severity: Severity,
    pub correlation_id: String,
    pub timestamp: OffsetDateTime,
    #[source]
    pub cause: Cause,
    pub retryable: bool,
}

impl XAppError {
    /// Wraps `cause` under `code`. Cancellation causes are always reported
    /// as [`ErrorCode::Cancelled`].
    pub fn wrap(
        code: ErrorCode,
        message: impl Into<String>,
        message_type: u32,
        correlation_id: &str,
        cause: Cause,
    ) -> Self {
        let code = if cause.is_cancellation() { ErrorCode::Cancelled } else { code };
        let retryable = cause.is_retryable();
        let severity = if retryable { Severity::Error } else { Severity::Critical };

        Self {
            code,
            message: message.into(),
            component: COMPONENT,
            message_type,
            severity,
            correlation_id: correlation_id.to_string(),
            timestamp: OffsetDateTime::now_utc(),
            cause,
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}
