//! `calbridge health`.

use calbridge_core::OutputFormat;

use crate::api::BackendClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Queries `/healthz` and prints the result. Fails when the backend is
/// unreachable or reports `ok: false`.
pub async fn health(config: &ClientConfig, format: OutputFormat) -> ClientResult<()> {
    let client = BackendClient::from_config(config)?;
    let status = client.health().await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string(&status).map_err(std::io::Error::from)?;
            println!("{}", json);
        }
        OutputFormat::Tty => {
            println!("backend: {}", client.base_url());
            if let Some(ref service) = status.service {
                println!("service: {}", service);
            }
            println!("ok: {}", status.ok);
            if let Some(ts) = status.timestamp {
                println!("timestamp: {}", ts.to_rfc3339());
            }
        }
    }

    if status.ok {
        Ok(())
    } else {
        Err(ClientError::Action("backend reports unhealthy".to_string()))
    }
}
