//! Login initiation.

use tracing::{info, warn};

use crate::api::BackendClient;

/// Shown for any failure to obtain the login URL.
pub const LOGIN_FAILED_MESSAGE: &str = "Failed to initiate login. Please try again.";

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The consent page to visit.
    Redirect { auth_url: String },
    /// Login could not start; carries the message to show.
    Failed { message: String },
}

/// Requests the Google consent URL from the backend.
///
/// Failures are collapsed into [`LOGIN_FAILED_MESSAGE`] and never retried.
#[derive(Debug, Clone)]
pub struct LoginInitiator {
    client: BackendClient,
}

impl LoginInitiator {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Asks the backend for the consent URL.
    pub async fn initiate(&self) -> LoginOutcome {
        match self.client.login_url().await {
            Ok(response) if !response.auth_url.trim().is_empty() => {
                info!("received login URL");
                LoginOutcome::Redirect {
                    auth_url: response.auth_url,
                }
            }
            Ok(_) => {
                warn!("backend returned an empty login URL");
                LoginOutcome::Failed {
                    message: LOGIN_FAILED_MESSAGE.to_string(),
                }
            }
            Err(err) => {
                warn!(kind = err.kind.as_str(), error = %err, "failed to get login URL");
                LoginOutcome::Failed {
                    message: LOGIN_FAILED_MESSAGE.to_string(),
                }
            }
        }
    }
}
