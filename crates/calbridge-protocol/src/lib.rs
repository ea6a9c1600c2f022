//! HTTP contract between calbridge and the session backend.
//!
//! The backend exposes a handful of JSON endpoints under `/auth/*` and
//! `/api/*`. This crate holds the paths, the request/response bodies, and the
//! rules for turning a failed response into an [`ApiError`].
//!
//! # Example
//!
//! ```rust
//! use calbridge_protocol::{ApiError, ApiErrorKind};
//!
//! let err = ApiError::from_response(500, Some("Internal Server Error"), r#"{"detail":"quota exceeded"}"#);
//! assert_eq!(err.kind, ApiErrorKind::Rejected);
//! assert_eq!(err.to_string(), "quota exceeded");
//! ```

mod error;
mod types;

pub use error::{ApiError, ApiErrorKind, ApiResult, decode_error_body};
pub use types::{
    AuthUrlResponse, EventsPage, EventsQuery, HealthStatus, LogoutResponse, UserInfo,
};

/// Returns the Google authorization URL.
pub const LOGIN_PATH: &str = "/auth/login";

/// Exchanges an authorization code for a session cookie.
pub const EXCHANGE_PATH: &str = "/auth/exchange";

/// Returns the signed-in user.
pub const ME_PATH: &str = "/auth/me";

/// Clears the session cookie.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Lists calendar events in a time window.
pub const EVENTS_PATH: &str = "/api/events";

/// Backend liveness probe.
pub const HEALTH_PATH: &str = "/healthz";

/// Timezone sent with event queries when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Asia/Bangkok";
