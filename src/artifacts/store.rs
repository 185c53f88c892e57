use super::{ArtifactBundle, ArtifactSource};
use crate::error::{AppError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

/// Holds the artifact bundle for the lifetime of the process.
///
/// The bundle is loaded at most once successfully. Concurrent first callers
/// wait on a single in-flight load; a failed load leaves the cell empty so
/// the next caller starts over from disk.
pub struct ArtifactStore {
    source: Option<ArtifactSource>,
    bundle: OnceCell<Arc<ArtifactBundle>>,
}

impl ArtifactStore {
    pub fn new(source: ArtifactSource) -> Self {
        Self {
            source: Some(source),
            bundle: OnceCell::new(),
        }
    }

    /// A store that already holds `bundle` and never touches the filesystem.
    pub fn preloaded(bundle: ArtifactBundle) -> Self {
        Self {
            source: None,
            bundle: OnceCell::new_with(Some(Arc::new(bundle))),
        }
    }

    /// Return the bundle, loading it first if no load has succeeded yet.
    pub async fn ensure_loaded(&self) -> Result<Arc<ArtifactBundle>> {
        if let Some(bundle) = self.bundle.get() {
            return Ok(Arc::clone(bundle));
        }

        let bundle = self.bundle.get_or_try_init(|| self.load()).await?;
        Ok(Arc::clone(bundle))
    }

    pub fn is_loaded(&self) -> bool {
        self.bundle.initialized()
    }

    /// The loaded bundle, if any, without attempting a load.
    pub fn get(&self) -> Option<Arc<ArtifactBundle>> {
        self.bundle.get().cloned()
    }

    async fn load(&self) -> Result<Arc<ArtifactBundle>> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| AppError::ArtifactLoad("No artifact source configured".to_string()))?;

        tracing::info!(
            classifier = %source.paths.classifier.display(),
            "Loading artifacts"
        );
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let bundle = ArtifactBundle::load(&source)?;
            bundle.warmup();
            Ok::<ArtifactBundle, AppError>(bundle)
        })
        .await
        .map_err(|e| AppError::ArtifactLoad(format!("Loader task join error: {}", e)))
        .and_then(|r| r);

        match result {
            Ok(bundle) => {
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Artifact bundle ready"
                );
                Ok(Arc::new(bundle))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load artifacts, will retry on next request");
                metrics::counter!("artifact_load_failures_total").increment(1);
                Err(e)
            }
        }
    }
}
