//! Bearer token refresh for the notes API
//!
//! ## Components
//!
//! - [`TokenProvider`] - Source of fresh bearer tokens
//! - [`StaticTokenProvider`] - Always hands out the same token
//! - [`FileTokenProvider`] - Re-reads a token file on every refresh
//! - [`AuthRefresher`] - Single-flight refresh triggered by HTTP 401
//!
//! ## Single-flight
//!
//! The refresher holds an atomic "refresh in progress" flag. The first
//! request that sees a 401 sets the flag and performs the refresh. Any
//! other request that sees a 401 while the flag is set gives up instead of
//! starting a second refresh, and surfaces `Unauthorized` to its caller.
//! The flag is cleared when the refresh ends, whether it succeeded or not.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::{debug, info, warn};

// ============================================================================
// TokenProvider
// ============================================================================

/// Source of fresh bearer tokens
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a new token to replace one the server rejected
    async fn refresh_token(&self) -> Result<String>;
}

/// Provider that always returns the same token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn refresh_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Provider that reads the token from a file
///
/// An external login helper can rotate the file; the next 401 picks up
/// whatever it contains at that moment.
#[derive(Debug, Clone)]
pub struct FileTokenProvider {
    path: PathBuf,
}

impl FileTokenProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the current token without going through a refresh
    pub async fn read(&self) -> Result<String> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read token file {}", self.path.display()))?;
        let token = raw.trim();
        if token.is_empty() {
            anyhow::bail!("Token file {} is empty", self.path.display());
        }
        Ok(token.to_string())
    }
}

#[async_trait::async_trait]
impl TokenProvider for FileTokenProvider {
    async fn refresh_token(&self) -> Result<String> {
        self.read().await
    }
}

// ============================================================================
// AuthRefresher
// ============================================================================

/// Clears the in-progress flag when the refresh scope ends
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Replaces a rejected bearer token and re-authenticates the failed request
pub struct AuthRefresher {
    provider: Arc<dyn TokenProvider>,
    token: Arc<RwLock<String>>,
    refreshing: AtomicBool,
    refreshes: AtomicU64,
}

impl AuthRefresher {
    /// Creates a refresher that writes new tokens into `token`
    ///
    /// # Arguments
    /// * `provider` - Where fresh tokens come from
    /// * `token` - Token slot shared with the HTTP client
    pub fn new(provider: Arc<dyn TokenProvider>, token: Arc<RwLock<String>>) -> Self {
        Self {
            provider,
            token,
            refreshing: AtomicBool::new(false),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Attempt a refresh after `failed` was answered with 401
    ///
    /// # Returns
    /// A copy of `failed` carrying the new token, or `None` when another
    /// refresh is already in flight or the provider failed.
    pub async fn authenticate(&self, mut failed: reqwest::Request) -> Option<reqwest::Request> {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            debug!(url = %failed.url(), "Token refresh already in flight, not retrying");
            return None;
        }
        let _guard = RefreshGuard(&self.refreshing);
        self.refreshes.fetch_add(1, Ordering::Relaxed);

        let token = match self.provider.refresh_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return None;
            }
        };

        let header = match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Refreshed token is not a valid header value");
                return None;
            }
        };

        match self.token.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
        failed.headers_mut().insert(AUTHORIZATION, header);

        info!(url = %failed.url(), "Token refreshed, retrying request");
        Some(failed)
    }

    /// Number of refreshes started so far
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Returns true while a refresh is running
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for AuthRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRefresher")
            .field("refreshing", &self.is_refreshing())
            .field("refreshes", &self.refresh_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use reqwest::{Method, Request};
    use tokio::sync::{oneshot, Mutex};

    use super::*;

    fn request() -> Request {
        Request::new(
            Method::GET,
            url::Url::parse("http://localhost/list").unwrap(),
        )
    }

    fn token_slot(initial: &str) -> Arc<RwLock<String>> {
        Arc::new(RwLock::new(initial.to_string()))
    }

    /// Provider that blocks until released, so a refresh can be held open
    struct GatedProvider {
        started: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait::async_trait]
    impl TokenProvider for GatedProvider {
        async fn refresh_token(&self) -> Result<String> {
            if let Some(tx) = self.started.lock().await.take() {
                let _ = tx.send(());
            }
            if let Some(rx) = self.release.lock().await.take() {
                let _ = rx.await;
            }
            Ok("fresh".to_string())
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl TokenProvider for FailingProvider {
        async fn refresh_token(&self) -> Result<String> {
            anyhow::bail!("identity provider unavailable")
        }
    }

    #[tokio::test]
    async fn test_refresh_sets_header_and_shared_token() {
        let slot = token_slot("stale");
        let refresher = AuthRefresher::new(Arc::new(StaticTokenProvider::new("fresh")), slot.clone());

        let retried = refresher.authenticate(request()).await.expect("retry request");
        assert_eq!(
            retried.headers().get(AUTHORIZATION).unwrap(),
            "Bearer fresh"
        );
        assert_eq!(*slot.read().unwrap(), "fresh");
        assert_eq!(refresher.refresh_count(), 1);
        assert!(!refresher.is_refreshing());
    }

    #[tokio::test]
    async fn test_concurrent_401_does_not_start_second_refresh() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let provider = GatedProvider {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(Some(release_rx)),
        };
        let refresher = Arc::new(AuthRefresher::new(Arc::new(provider), token_slot("stale")));

        let first = {
            let refresher = Arc::clone(&refresher);
            tokio::spawn(async move { refresher.authenticate(request()).await })
        };
        started_rx.await.unwrap();
        assert!(refresher.is_refreshing());

        // second wave member sees the flag and declines
        assert!(refresher.authenticate(request()).await.is_none());

        release_tx.send(()).unwrap();
        let retried = first.await.unwrap();
        assert!(retried.is_some());
        assert_eq!(refresher.refresh_count(), 1);
        assert!(!refresher.is_refreshing());

        // a later 401 is a new wave and may refresh again
        assert!(refresher.authenticate(request()).await.is_some());
        assert_eq!(refresher.refresh_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_flag() {
        let slot = token_slot("stale");
        let refresher = AuthRefresher::new(Arc::new(FailingProvider), slot.clone());

        assert!(refresher.authenticate(request()).await.is_none());
        assert!(!refresher.is_refreshing());
        assert_eq!(*slot.read().unwrap(), "stale");
    }

    #[tokio::test]
    async fn test_file_token_provider_reads_trimmed_token() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "  rotated-token  ").unwrap();
        let provider = FileTokenProvider::new(tmp.path());
        assert_eq!(provider.refresh_token().await.unwrap(), "rotated-token");

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(FileTokenProvider::new(empty.path()).read().await.is_err());
        assert!(FileTokenProvider::new("/nonexistent/token").read().await.is_err());
    }
}
