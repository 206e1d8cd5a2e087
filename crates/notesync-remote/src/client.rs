//! Notes API HTTP client
//!
//! Provides a typed HTTP client for the notes server. Handles the bearer
//! token, the optional failure-injection header, status classification and
//! the single authenticated retry after a token refresh.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use notesync_remote::client::NotesApiClient;
//! use reqwest::Method;
//!
//! # async fn example() -> Result<(), notesync_core::domain::SyncError> {
//! let client = NotesApiClient::with_base_url("token", "http://localhost:8080/todo");
//! let response = client.execute(client.request(Method::GET, "/list")).await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use notesync_core::config::RemoteConfig;
use notesync_core::domain::SyncError;

use crate::auth::{AuthRefresher, TokenProvider};

/// Error body fragment the server uses to reject a stale revision
pub const OUT_OF_SYNC_MARKER: &str = "unsynchronized data";

/// Header carrying the client's last known revision on mutations
pub const REVISION_HEADER: &str = "X-Last-Known-Revision";

/// Header asking the server to inject random failures
pub const GENERATE_FAILS_HEADER: &str = "X-Generate-Fails";

/// HTTP client for the notes API
///
/// Wraps `reqwest::Client` with authentication headers and base URL
/// construction. When a [`AuthRefresher`] is attached, a 401 answer triggers
/// one refresh and one retry of the same request.
#[derive(Debug)]
pub struct NotesApiClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests, without trailing slash
    base_url: String,
    /// Current bearer token, shared with the refresher
    token: Arc<RwLock<String>>,
    /// Optional single-flight token refresher
    refresher: Option<Arc<AuthRefresher>>,
    /// Value for `X-Generate-Fails`, if any
    generate_fails: Option<u32>,
}

impl NotesApiClient {
    /// Creates a client for `base_url` with a default `reqwest::Client`
    ///
    /// # Arguments
    /// * `token` - Bearer token
    /// * `base_url` - API root, e.g. `https://host/todo`
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(token.into())),
            refresher: None,
            generate_fails: None,
        }
    }

    /// Creates a client from the `remote` configuration section
    ///
    /// # Errors
    /// Returns `SyncError::Unknown` if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &RemoteConfig, token: impl Into<String>) -> Result<Self, SyncError> {
        url::Url::parse(&config.base_url)
            .map_err(|e| SyncError::Unknown(format!("invalid base URL {}: {e}", config.base_url)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(token.into())),
            refresher: None,
            generate_fails: config.generate_fails,
        })
    }

    /// Attaches a refresher fed by `provider`, sharing this client's token
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.refresher = Some(Arc::new(AuthRefresher::new(
            provider,
            Arc::clone(&self.token),
        )));
        self
    }

    /// Sets the `X-Generate-Fails` threshold
    pub fn with_generate_fails(mut self, threshold: Option<u32>) -> Self {
        self.generate_fails = threshold;
        self
    }

    /// Returns the refresher, if configured
    pub fn refresher(&self) -> Option<&Arc<AuthRefresher>> {
        self.refresher.as_ref()
    }

    /// Returns the current bearer token
    pub fn token(&self) -> String {
        match self.token.read() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the bearer token
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        match self.token.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
        debug!("Updated NotesApiClient token");
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g. "/list")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, &url)
            .bearer_auth(self.token())
            .header(ACCEPT, "application/json");
        if let Some(threshold) = self.generate_fails {
            builder = builder.header(GENERATE_FAILS_HEADER, threshold);
        }
        builder
    }

    // ========================================================================
    // Request execution
    // ========================================================================

    /// Sends a request, refreshing the token and retrying once on HTTP 401
    ///
    /// Only transport failures are errors here; the caller inspects the
    /// status of the returned response.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response, SyncError> {
        let request = builder
            .build()
            .map_err(|e| SyncError::Unknown(format!("failed to build request: {e}")))?;
        let retry_copy = request.try_clone();
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.client.execute(request).await.map_err(transport_error)?;
        debug!(%method, path = %path, status = response.status().as_u16(), "Notes API response");

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let (Some(refresher), Some(copy)) = (self.refresher.as_ref(), retry_copy) else {
            return Ok(response);
        };
        match refresher.authenticate(copy).await {
            Some(reauthenticated) => {
                info!(%method, path = %path, "Retrying request with refreshed token");
                self.client
                    .execute(reauthenticated)
                    .await
                    .map_err(transport_error)
            }
            None => Ok(response),
        }
    }

    /// Sends a request and decodes a successful JSON body
    ///
    /// # Arguments
    /// * `builder` - Request to send
    /// * `mutating` - Whether a stale-revision rejection is possible
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        mutating: bool,
    ) -> Result<T, SyncError> {
        let response = self.execute(builder).await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| SyncError::Unknown(format!("failed to decode response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body, mutating))
    }
}

/// Map a non-success response to the error taxonomy
pub fn classify_failure(status: StatusCode, body: &str, mutating: bool) -> SyncError {
    if status == StatusCode::UNAUTHORIZED {
        return SyncError::Unauthorized;
    }
    if mutating && body.contains(OUT_OF_SYNC_MARKER) {
        warn!(status = status.as_u16(), "Server reported out-of-sync revision");
        return SyncError::OutOfSync;
    }
    let message = if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        body.to_string()
    };
    SyncError::Remote {
        status: status.as_u16(),
        message,
    }
}

fn transport_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        SyncError::NetworkTimeout(e.to_string())
    } else {
        SyncError::Unknown(e.to_string())
    }
}
