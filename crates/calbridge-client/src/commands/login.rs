//! `calbridge login`.

use calbridge_core::OutputFormat;
use serde_json::json;
use tracing::warn;

use crate::actions;
use crate::api::BackendClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::login::{LoginInitiator, LoginOutcome};

/// Fetches the consent URL, prints it, and opens it in the browser.
///
/// The session cookie cannot outlive this process, so finishing sign-in
/// needs `calbridge session`.
pub async fn login(config: &ClientConfig, open_browser: bool, format: OutputFormat) -> ClientResult<()> {
    let initiator = LoginInitiator::new(BackendClient::from_config(config)?);

    let auth_url = match initiator.initiate().await {
        LoginOutcome::Redirect { auth_url } => auth_url,
        LoginOutcome::Failed { message } => return Err(ClientError::Login(message)),
    };

    match format {
        OutputFormat::Json => println!("{}", json!({ "auth_url": auth_url })),
        OutputFormat::Tty => println!("{}", auth_url),
    }

    if open_browser {
        if let Err(e) = actions::open_url(&auth_url) {
            warn!(error = %e, "could not open browser");
        }
    }

    Ok(())
}
