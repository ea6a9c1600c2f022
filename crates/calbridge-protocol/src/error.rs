//! Backend error classification and error-body decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Broad category of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// The request never produced an HTTP response.
    Transport,
    /// 401 or 403: no valid session.
    Unauthorized,
    /// Any other non-2xx response.
    Rejected,
    /// A 2xx response whose body did not have the expected shape.
    InvalidResponse,
}

impl ApiErrorKind {
    /// Returns the snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Unauthorized => "unauthorized",
            Self::Rejected => "rejected",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

/// A failed backend call.
///
/// `Display` is the user-facing message only, so it can be shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    /// Creates a new error.
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, None, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, Some(status), message)
    }

    /// Creates a rejection error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Rejected, Some(status), message)
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidResponse, Some(status), message)
    }

    /// Classifies a non-2xx response and decodes its body.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        let message = decode_error_body(status, reason, body);
        match status {
            401 | 403 => Self::unauthorized(status, message),
            _ => Self::rejected(status, message),
        }
    }

    /// Returns `true` if the session is missing or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

/// Picks the message for a non-2xx response body.
///
/// In order: a JSON object's string `detail`; the raw body when it is not
/// JSON and not blank; `API Error: <status> <reason>`.
pub fn decode_error_body(status: u16, reason: Option<&str>, body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail").and_then(|d| d.as_str()) {
            Some(detail) if !detail.is_empty() => detail.to_string(),
            _ => generic_message(status, reason),
        },
        Err(_) if !body.trim().is_empty() => body.to_string(),
        Err(_) => generic_message(status, reason),
    }
}

fn generic_message(status: u16, reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!("API Error: {} {}", status, reason),
        _ => format!("API Error: {}", status),
    }
}
