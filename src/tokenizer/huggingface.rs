//! HuggingFace `tokenizers` backed implementation of [`Tokenizer`]

use std::{path::Path, str::FromStr};

use super::{
    error::{LoadCause, TokenizerError},
    traits::{BoundaryMarkers, Encoding, TokenIdType, Tokenizer},
};

/// Wraps a `tokenizers::Tokenizer` loaded from a `tokenizer.json` definition.
///
/// Encoding always adds the family's special tokens and reports character
/// offsets, so spans index into the text the caller sent rather than its UTF-8 bytes.
pub struct HuggingFaceTokenizer {
    inner: tokenizers::Tokenizer,
    boundary_markers: BoundaryMarkers,
}

impl HuggingFaceTokenizer {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadCause> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            LoadCause::InvalidTokenizer(format!("{}: {}", path.display(), e))
        })?;
        Ok(Self::new(inner))
    }

    pub fn from_json(json: &str) -> Result<Self, LoadCause> {
        let inner = tokenizers::Tokenizer::from_str(json)
            .map_err(|e| LoadCause::InvalidTokenizer(e.to_string()))?;
        Ok(Self::new(inner))
    }

    fn new(inner: tokenizers::Tokenizer) -> Self {
        Self {
            inner,
            boundary_markers: BoundaryMarkers::default(),
        }
    }

    pub fn with_boundary_markers(mut self, boundary_markers: BoundaryMarkers) -> Self {
        self.boundary_markers = boundary_markers;
        self
    }
}

impl Tokenizer for HuggingFaceTokenizer {
    fn encode(&self, text: &str) -> Result<Encoding, TokenizerError> {
        let encoding = self
            .inner
            .encode_char_offsets(text, true)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;
        Encoding::new(encoding.get_ids().to_vec(), encoding.get_offsets().to_vec())
    }

    fn id_to_token(&self, id: TokenIdType) -> Option<String> {
        self.inner.id_to_token(id)
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn boundary_markers(&self) -> BoundaryMarkers {
        self.boundary_markers
    }
}
