//! Composition root
//!
//! Builds the local store, the HTTP adapter and the coordinator from the
//! loaded configuration. Nothing else in the binary constructs adapters.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use notesync_cache::{JsonFileNoteStore, SqliteNoteStore};
use notesync_core::config::{AuthConfig, Config, StorageConfig};
use notesync_core::ports::{INoteStore, IRemoteNotes};
use notesync_remote::{
    FileTokenProvider, HttpRemoteNotes, NotesApiClient, StaticTokenProvider, TokenProvider,
};
use notesync_sync::{RetryExecutor, RetryPolicy, SyncCoordinator};

/// Wired application services for one CLI invocation
pub struct AppContext {
    pub config: Config,
    pub coordinator: Arc<SyncCoordinator>,
}

impl AppContext {
    pub async fn build(config: Config) -> Result<Self> {
        let errors = config.validate();
        if let Some(first) = errors.first() {
            anyhow::bail!("Invalid configuration: {first}");
        }

        let store = open_store(&config.storage).await?;
        let remote = build_remote(&config).await?;
        let retry = RetryExecutor::new(RetryPolicy::from(&config.retry));

        info!(
            base_url = %config.remote.base_url,
            backend = %config.storage.backend,
            "Initialized notesync context"
        );

        Ok(Self {
            coordinator: Arc::new(SyncCoordinator::new(store, remote, retry)),
            config,
        })
    }

    /// Name recorded as `last_modified_by` on local edits
    pub fn client_id(&self) -> &str {
        &self.config.remote.client_id
    }
}

async fn open_store(storage: &StorageConfig) -> Result<Arc<dyn INoteStore>> {
    let path = storage.resolved_path();
    debug!(path = %path.display(), backend = %storage.backend, "Opening note cache");

    let store: Arc<dyn INoteStore> = match storage.backend.as_str() {
        "sqlite" => Arc::new(
            SqliteNoteStore::open(&path)
                .await
                .with_context(|| format!("Failed to open note database {}", path.display()))?,
        ),
        _ => Arc::new(
            JsonFileNoteStore::open(path.clone())
                .await
                .with_context(|| format!("Failed to open note file {}", path.display()))?,
        ),
    };
    Ok(store)
}

async fn build_remote(config: &Config) -> Result<Arc<dyn IRemoteNotes>> {
    let (token, provider) = token_source(&config.auth).await?;
    let client = NotesApiClient::from_config(&config.remote, token)
        .context("Failed to create notes API client")?
        .with_token_provider(provider);
    Ok(Arc::new(HttpRemoteNotes::new(client)))
}

/// Initial token plus the provider consulted after a 401
///
/// A token file is re-read on every refresh; a literal token can only be
/// replayed as is.
async fn token_source(auth: &AuthConfig) -> Result<(String, Arc<dyn TokenProvider>)> {
    if let Some(path) = &auth.token_file {
        let provider = FileTokenProvider::new(path.clone());
        let token = match &auth.token {
            Some(token) => token.clone(),
            None => provider
                .read()
                .await
                .with_context(|| format!("Failed to read token file {}", path.display()))?,
        };
        return Ok((token, Arc::new(provider)));
    }

    let token = auth.token.clone().unwrap_or_default();
    Ok((token.clone(), Arc::new(StaticTokenProvider::new(token))))
}
