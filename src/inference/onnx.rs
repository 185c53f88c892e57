use crate::error::{AppError, Result};
use crate::inference::classifier::{Classifier, FeatureVector, FEATURE_COUNT};
use crossbeam::queue::ArrayQueue;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use std::cell::UnsafeCell;
use std::sync::Arc;

/// Settings for building ONNX classifier sessions.
#[derive(Debug, Clone)]
pub struct OnnxOptions {
    /// Graph input receiving the `[1, 4]` float tensor.
    pub input_name: String,
    /// Graph output holding the int64 class code.
    pub label_output: String,
    pub pool_size: usize,
    pub intra_threads: usize,
}

/// A pool of ONNX Runtime sessions running an exported classifier.
///
/// `Session::run` needs `&mut self`, so each call takes an exclusive session
/// index from a lock-free queue and returns it afterwards. Callers are gated
/// by a semaphore sized to the pool, so the queue is never empty in practice.
pub struct OnnxClassifier {
    sessions: Vec<UnsafeCell<Session>>,
    available: Arc<ArrayQueue<usize>>,
    input_name: String,
    label_output: String,
}

impl OnnxClassifier {
    /// Build `options.pool_size` sessions from an in-memory model.
    pub fn load_pool(model_bytes: &[u8], options: &OnnxOptions) -> Result<Self> {
        let pool_size = options.pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        let available = Arc::new(ArrayQueue::new(pool_size));

        for i in 0..pool_size {
            let session = Session::builder()
                .map_err(|e| AppError::ArtifactLoad(e.to_string()))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| AppError::ArtifactLoad(e.to_string()))?
                .with_intra_threads(options.intra_threads.max(1))
                .map_err(|e| AppError::ArtifactLoad(e.to_string()))?
                .commit_from_memory(model_bytes)
                .map_err(|e: ort::Error| AppError::ArtifactLoad(e.to_string()))?;

            sessions.push(UnsafeCell::new(session));
            available
                .push(i)
                .map_err(|_| AppError::ArtifactLoad("Failed to initialize session pool".into()))?;
        }

        tracing::info!(
            pool_size,
            input = %options.input_name,
            output = %options.label_output,
            "ONNX classifier session pool loaded"
        );

        Ok(Self {
            sessions,
            available,
            input_name: options.input_name.clone(),
            label_output: options.label_output.clone(),
        })
    }

    /// Sessions not currently held by a caller.
    pub fn idle_sessions(&self) -> usize {
        self.available.len()
    }

    pub fn pool_size(&self) -> usize {
        self.sessions.len()
    }

    fn acquire_session(&self) -> Result<usize> {
        self.available
            .pop()
            .ok_or_else(|| AppError::Resource("No available sessions in pool".into()))
    }

    fn release_session(&self, index: usize) {
        let _ = self.available.push(index);
    }

    fn run_on_session(&self, session_idx: usize, features: &FeatureVector) -> Result<i64> {
        let input = Tensor::from_array(([1usize, FEATURE_COUNT], features.to_f32_vec()))
            .map_err(|e| AppError::Prediction(e.to_string()))?;

        // SAFETY: session_idx came from the queue and is held by this thread
        // alone until release_session() is called.
        let session = unsafe { &mut *self.sessions[session_idx].get() };

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| AppError::Prediction(e.to_string()))?;

        let label = outputs.get(self.label_output.as_str()).ok_or_else(|| {
            AppError::Prediction(format!("No '{}' output found", self.label_output))
        })?;

        let (_shape, data) = label
            .try_extract_tensor::<i64>()
            .map_err(|e| AppError::Prediction(e.to_string()))?;

        data.first()
            .copied()
            .ok_or_else(|| AppError::Prediction("Classifier returned an empty label tensor".into()))
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        let session_idx = self.acquire_session()?;
        let result = self.run_on_session(session_idx, features);
        self.release_session(session_idx);
        result
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

// SAFETY: every UnsafeCell<Session> is only dereferenced between a pop and
// the matching push on the ArrayQueue, which hands each index to at most one
// thread at a time.
unsafe impl Send for OnnxClassifier {}
unsafe impl Sync for OnnxClassifier {}
