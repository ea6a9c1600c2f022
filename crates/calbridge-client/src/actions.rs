//! Desktop actions.

use tracing::info;

use crate::error::{ClientError, ClientResult};

/// Opens `url` in the default browser.
pub fn open_url(url: &str) -> ClientResult<()> {
    info!(url = %url, "opening browser");
    open::that(url).map_err(|e| ClientError::Action(format!("failed to open URL: {}", e)))
}
