//! OAuth callback handling.
//!
//! After consent, Google redirects the browser to the frontend's callback page
//! with `code` and `state` (or `error`) in the query string. The user pastes
//! that URL into the session; [`CallbackHandler`] validates it and forwards
//! the pair to the backend exactly once.
//!
//! ```text
//! pending ──error=…──────────────▶ failed(provider denied)
//!    │    ──no code/state────────▶ failed(malformed)
//!    │    ──code already sent────▶ failed(code reused)
//!    └──── POST /auth/exchange ──▶ authenticated | failed(rejected | transport)
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use calbridge_protocol::{ApiError, ApiErrorKind};
use tracing::{debug, info, warn};
use url::{Url, form_urlencoded};

use crate::api::BackendClient;

/// Query parameters of the OAuth redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Error token from the provider, e.g. `access_denied`.
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parses a pasted callback URL, or a bare query string (`?code=…&state=…`).
    ///
    /// Empty values count as absent.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match Url::parse(input) {
            Ok(url) => Self::from_pairs(url.query_pairs()),
            Err(_) => {
                // Drop a leading path; a `?` inside a value stays part of the query.
                let query = match input.split_once('?') {
                    Some((path, query)) if !path.contains('=') => query,
                    _ => input,
                };
                Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
            }
        }
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Decides what to do without touching the network.
    ///
    /// Returns the `(code, state)` pair to exchange, or why there is none.
    pub fn validate(&self) -> Result<(&str, &str), CallbackFailure> {
        if let Some(ref error) = self.error {
            return Err(CallbackFailure::ProviderDenied {
                error: error.clone(),
            });
        }
        match (self.code.as_deref(), self.state.as_deref()) {
            (Some(code), Some(state)) => Ok((code, state)),
            _ => Err(CallbackFailure::Malformed),
        }
    }
}

/// Why a callback did not authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackFailure {
    /// The provider sent `error` instead of a code.
    ProviderDenied { error: String },
    /// `code` or `state` missing.
    Malformed,
    /// This code was already sent to the backend during this session.
    CodeReused,
    /// The backend refused the exchange.
    Rejected { reason: String },
    /// The exchange request never got a response.
    Transport { message: String },
}

impl CallbackFailure {
    /// Short name for logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderDenied { .. } => "provider_denied",
            Self::Malformed => "malformed",
            Self::CodeReused => "code_reused",
            Self::Rejected { .. } => "rejected",
            Self::Transport { .. } => "transport",
        }
    }
}

impl fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderDenied { error } => write!(f, "Authentication failed: {}", error),
            Self::Malformed => f.write_str("Missing code or state parameter"),
            Self::CodeReused => f.write_str("authorization code has already been used"),
            Self::Rejected { reason } => f.write_str(reason),
            Self::Transport { message } => f.write_str(message),
        }
    }
}

impl From<ApiError> for CallbackFailure {
    fn from(err: ApiError) -> Self {
        match err.kind {
            ApiErrorKind::Transport => Self::Transport {
                message: err.message,
            },
            _ => Self::Rejected {
                reason: err.message,
            },
        }
    }
}

/// Where a callback handler is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallbackState {
    #[default]
    Pending,
    Authenticated,
    Failed(CallbackFailure),
}

impl CallbackState {
    /// Returns `true` once the handler has settled.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Authorization codes already handed to the backend in this process.
#[derive(Debug, Default)]
pub struct ExchangedCodes(HashSet<String>);

impl ExchangedCodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `code` was already sent.
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    /// Records `code`; returns `false` if it was already recorded.
    pub fn record(&mut self, code: &str) -> bool {
        self.0.insert(code.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Runs one callback to completion.
#[derive(Debug)]
pub struct CallbackHandler {
    client: BackendClient,
    state: CallbackState,
}

impl CallbackHandler {
    /// Creates a pending handler.
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            state: CallbackState::Pending,
        }
    }

    /// Current state.
    pub fn state(&self) -> &CallbackState {
        &self.state
    }

    /// Handles the callback.
    ///
    /// A settled handler returns its state again without calling the backend.
    pub async fn handle(
        &mut self,
        params: &CallbackParams,
        exchanged: &mut ExchangedCodes,
    ) -> &CallbackState {
        if self.state.is_settled() {
            debug!("callback already handled");
            return &self.state;
        }

        self.state = match params.validate() {
            Err(failure) => {
                info!(reason = failure.as_str(), "callback not exchanged");
                CallbackState::Failed(failure)
            }
            Ok((code, _)) if exchanged.contains(code) => {
                warn!("authorization code already exchanged in this session");
                CallbackState::Failed(CallbackFailure::CodeReused)
            }
            Ok((code, state)) => {
                exchanged.record(code);
                match self.client.exchange(code, state).await {
                    Ok(()) => {
                        info!("authorization code exchanged");
                        CallbackState::Authenticated
                    }
                    Err(err) => {
                        warn!(kind = err.kind.as_str(), status = ?err.status, "code exchange failed");
                        CallbackState::Failed(err.into())
                    }
                }
            }
        };

        &self.state
    }
}
