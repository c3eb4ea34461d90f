//! Tokenizer loading
//!
//! [`TokenizerLoader`] is the boundary between the cache and whatever produces
//! tokenizer instances. [`HubTokenizerLoader`] resolves a model identifier as a
//! local `tokenizer.json`, a local model directory, or a HuggingFace Hub repository.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use hf_hub::api::sync::ApiBuilder;
use tracing::debug;

use super::{
    error::LoadCause,
    huggingface::HuggingFaceTokenizer,
    traits::{BoundaryMarkers, Tokenizer},
};

/// File fetched from a model repository or directory
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Produces tokenizer instances for model identifiers.
///
/// `load` may block on network and disk; callers run it off the async runtime.
pub trait TokenizerLoader: Send + Sync {
    fn load(
        &self,
        model_id: &str,
        credential: Option<&str>,
    ) -> Result<Arc<dyn Tokenizer>, LoadCause>;
}

/// Loads `tokenizer.json` definitions from disk or the HuggingFace Hub
#[derive(Debug, Clone, Default)]
pub struct HubTokenizerLoader {
    cache_dir: Option<PathBuf>,
    boundary_markers: BoundaryMarkers,
}

impl HubTokenizerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the hf-hub download cache location
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn with_boundary_markers(mut self, boundary_markers: BoundaryMarkers) -> Self {
        self.boundary_markers = boundary_markers;
        self
    }

    fn resolve(&self, model_id: &str, credential: Option<&str>) -> Result<PathBuf, LoadCause> {
        let local = Path::new(model_id);
        if local.is_file() {
            return Ok(local.to_path_buf());
        }
        if local.is_dir() {
            let candidate = local.join(TOKENIZER_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            return Err(LoadCause::NotFound(candidate.display().to_string()));
        }
        self.download(model_id, credential)
    }

    fn download(&self, model_id: &str, credential: Option<&str>) -> Result<PathBuf, LoadCause> {
        debug!(model_id = %model_id, "Fetching tokenizer from HuggingFace Hub");

        let mut builder = ApiBuilder::new().with_progress(false);
        // Without an explicit credential hf-hub falls back to its token file.
        if let Some(token) = credential {
            builder = builder.with_token(Some(token.to_string()));
        }
        if let Some(dir) = &self.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }

        let api = builder
            .build()
            .map_err(|e| LoadCause::Hub(format!("failed to create hub client: {}", e)))?;
        api.model(model_id.to_string())
            .get(TOKENIZER_FILE)
            .map_err(|e| LoadCause::Hub(e.to_string()))
    }
}

impl TokenizerLoader for HubTokenizerLoader {
    fn load(
        &self,
        model_id: &str,
        credential: Option<&str>,
    ) -> Result<Arc<dyn Tokenizer>, LoadCause> {
        let path = self.resolve(model_id, credential)?;
        debug!(model_id = %model_id, path = %path.display(), "Reading tokenizer definition");
        let tokenizer =
            HuggingFaceTokenizer::from_file(&path)?.with_boundary_markers(self.boundary_markers);
        Ok(Arc::new(tokenizer))
    }
}
