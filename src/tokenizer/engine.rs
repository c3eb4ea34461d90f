//! Tokenization of request text against cached tokenizers

use std::sync::Arc;

use tracing::{debug, error};

use super::{
    cache::TokenizerCache,
    error::{TokenizeError, TokenizerError},
    traits::{BoundaryMarkers, Tokenizer},
};

/// Tokens and character spans for one request, boundary markers removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingResult {
    pub token_count: usize,
    pub tokens: Vec<String>,
    pub offsets: Vec<(usize, usize)>,
}

impl EncodingResult {
    fn new(tokens: Vec<String>, offsets: Vec<(usize, usize)>) -> Self {
        Self {
            token_count: tokens.len(),
            tokens,
            offsets,
        }
    }
}

/// Resolves tokenizers through the shared cache and shapes their output.
#[derive(Debug, Clone)]
pub struct TokenizationEngine {
    cache: Arc<TokenizerCache>,
}

impl TokenizationEngine {
    pub fn new(cache: Arc<TokenizerCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<TokenizerCache> {
        &self.cache
    }

    /// Tokenize `text` with the tokenizer for `model_id`.
    ///
    /// Empty text is valid and usually yields an empty result.
    ///
    /// # Errors
    ///
    /// [`TokenizeError::LoadFailed`] if the tokenizer cannot be loaded,
    /// [`TokenizeError::EncodingFailed`] if the loaded tokenizer fails on `text`.
    pub async fn tokenize(
        &self,
        model_id: &str,
        text: &str,
    ) -> Result<EncodingResult, TokenizeError> {
        let tokenizer = self.tokenizer(model_id).await?;
        self.encode(model_id, tokenizer.as_ref(), text)
    }

    /// Resolve the tokenizer for `model_id`, loading it on a cache miss.
    pub async fn tokenizer(&self, model_id: &str) -> Result<Arc<dyn Tokenizer>, TokenizeError> {
        Ok(self.cache.get_or_load(model_id).await?)
    }

    /// Encode `text` with an already resolved tokenizer and strip its boundary markers.
    pub fn encode(
        &self,
        model_id: &str,
        tokenizer: &dyn Tokenizer,
        text: &str,
    ) -> Result<EncodingResult, TokenizeError> {
        let encoding = tokenizer
            .encode(text)
            .map_err(|cause| encoding_failed(model_id, cause))?;

        let tokens = encoding
            .token_ids()
            .iter()
            .map(|&id| {
                tokenizer
                    .id_to_token(id)
                    .ok_or(TokenizerError::UnknownTokenId(id))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|cause| encoding_failed(model_id, cause))?;

        let markers = tokenizer.boundary_markers();
        let tokens = strip_boundary_markers(tokens, markers);
        let offsets = strip_boundary_markers(encoding.offsets().to_vec(), markers);

        debug!(
            model_id = %model_id,
            raw_tokens = encoding.len(),
            tokens = tokens.len(),
            "Tokenized text"
        );
        Ok(EncodingResult::new(tokens, offsets))
    }
}

fn encoding_failed(model_id: &str, cause: TokenizerError) -> TokenizeError {
    error!(model_id = %model_id, error = %cause, "Error tokenizing text");
    TokenizeError::EncodingFailed {
        model_id: model_id.to_string(),
        cause,
    }
}

/// Drop the leading and trailing marker of a wrapped sequence. Sequences too
/// short to hold both markers carry no text tokens.
fn strip_boundary_markers<T>(mut items: Vec<T>, markers: BoundaryMarkers) -> Vec<T> {
    match markers {
        BoundaryMarkers::None => items,
        BoundaryMarkers::Wrapped if items.len() < 2 => Vec::new(),
        BoundaryMarkers::Wrapped => {
            items.pop();
            items.remove(0);
            items
        }
    }
}
