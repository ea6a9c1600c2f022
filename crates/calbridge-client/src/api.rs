//! HTTP client for the session backend.
//!
//! Every request goes through one `reqwest::Client` with an in-memory cookie
//! jar, so the session cookie set by `/auth/exchange` is sent back on later
//! calls. The cookie is never read or written by calbridge itself and is gone
//! when the process exits.

use std::time::Duration;

use calbridge_protocol::{
    ApiError, ApiResult, AuthUrlResponse, EXCHANGE_PATH, EVENTS_PATH, EventsPage, EventsQuery,
    HEALTH_PATH, HealthStatus, LOGIN_PATH, LOGOUT_PATH, LogoutResponse, ME_PATH, UserInfo,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Backend API client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Creates a client for `base_url`.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("calbridge/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Creates a client from the `[server]` settings.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.base_url()?, config.timeout())
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for a backend path, keeping any path prefix of the base URL.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, path));
        url.set_query(None);
        url
    }

    /// `GET /auth/login`: the Google consent URL.
    pub async fn login_url(&self) -> ApiResult<AuthUrlResponse> {
        let request = self.http_client.get(self.endpoint(LOGIN_PATH));
        let (status, body) = self.execute(request, LOGIN_PATH).await?;
        parse_json(status, &body)
    }

    /// `POST /auth/exchange?code=…&state=…`.
    ///
    /// Success means the backend set the session cookie; the body is ignored.
    pub async fn exchange(&self, code: &str, state: &str) -> ApiResult<()> {
        let url = format!(
            "{}?code={}&state={}",
            self.endpoint(EXCHANGE_PATH),
            urlencoding::encode(code),
            urlencoding::encode(state)
        );
        let request = self.http_client.post(url);
        self.execute(request, EXCHANGE_PATH).await?;
        Ok(())
    }

    /// `GET /auth/me`.
    pub async fn me(&self) -> ApiResult<UserInfo> {
        let request = self.http_client.get(self.endpoint(ME_PATH));
        let (status, body) = self.execute(request, ME_PATH).await?;
        parse_json(status, &body)
    }

    /// `POST /auth/logout`.
    pub async fn logout(&self) -> ApiResult<LogoutResponse> {
        let request = self.http_client.post(self.endpoint(LOGOUT_PATH));
        let (status, body) = self.execute(request, LOGOUT_PATH).await?;
        parse_json(status, &body)
    }

    /// `GET /api/events`: one page.
    pub async fn events(&self, query: &EventsQuery) -> ApiResult<EventsPage> {
        let request = self
            .http_client
            .get(self.endpoint(EVENTS_PATH))
            .query(&query.to_pairs());
        let (status, body) = self.execute(request, EVENTS_PATH).await?;
        parse_json(status, &body)
    }

    /// `GET /healthz`.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let request = self.http_client.get(self.endpoint(HEALTH_PATH));
        let (status, body) = self.execute(request, HEALTH_PATH).await?;
        parse_json(status, &body)
    }

    /// Sends a request and returns the status and body of a 2xx response.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> ApiResult<(u16, String)> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, "backend request failed");
                if e.is_timeout() {
                    ApiError::transport("Request timed out. Please try again.")
                } else {
                    ApiError::transport("Unable to reach the server. Please try again.")
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(path, error = %e, "failed to read backend response");
            ApiError::transport("Connection lost while reading the response.")
        })?;

        debug!(path, status = status.as_u16(), bytes = body.len(), "backend response");

        if !status.is_success() {
            return Err(ApiError::from_response(
                status.as_u16(),
                status.canonical_reason(),
                &body,
            ));
        }

        Ok((status.as_u16(), body))
    }
}

fn parse_json<T: DeserializeOwned>(status: u16, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "unexpected backend response body");
        ApiError::invalid_response(status, format!("unexpected response from server: {}", e))
    })
}
