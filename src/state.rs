use crate::artifacts::{ArtifactBundle, ArtifactSource, ArtifactStore};
use crate::config::Config;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Application state shared across all request handlers.
pub struct AppState {
    pub artifacts: Arc<ArtifactStore>,
    /// Permits = classifier session pool size, so a request holding a permit
    /// always finds a free session.
    pub semaphore: Arc<Semaphore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state whose artifacts load from the configured directory.
    /// Nothing is read from disk here; see [`AppState::load_artifacts`].
    pub fn new(config: Config) -> Self {
        let store = ArtifactStore::new(ArtifactSource::from_config(&config));
        Self::with_store(config, store)
    }

    /// Build state around an already-loaded bundle.
    pub fn with_bundle(config: Config, bundle: ArtifactBundle) -> Self {
        Self::with_store(config, ArtifactStore::preloaded(bundle))
    }

    fn with_store(config: Config, store: ArtifactStore) -> Self {
        let permits = config.effective_pool_size();
        tracing::info!(permits, "Configured inference permits");

        Self {
            artifacts: Arc::new(store),
            semaphore: Arc::new(Semaphore::new(permits)),
            config: Arc::new(config),
        }
    }

    /// Attempt the initial artifact load. Failure is logged, not fatal:
    /// prediction requests keep retrying until a load succeeds.
    pub async fn load_artifacts(&self) -> bool {
        match self.artifacts.ensure_loaded().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Initial artifact load failed, serving anyway");
                false
            }
        }
    }

    /// Check if the service is ready to handle predictions.
    pub fn is_ready(&self) -> bool {
        self.artifacts.is_loaded()
    }
}
