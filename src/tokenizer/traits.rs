//! Tokenizer handle abstraction.
//!
//! A [`Tokenizer`] is the immutable, loaded state of a model's tokenizer. Handles
//! are shared across requests as `Arc<dyn Tokenizer>` and never mutated after
//! construction.

use serde::{Deserialize, Serialize};

use super::error::TokenizerError;

/// Token id type used by all tokenizer families
pub type TokenIdType = u32;

/// Raw output of a tokenizer for a single input string.
///
/// `offsets[i]` is the half-open character span of `ids[i]` in the input.
/// Synthetic tokens that do not come from the text (e.g. `[CLS]`) carry `(0, 0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    ids: Vec<TokenIdType>,
    offsets: Vec<(usize, usize)>,
}

impl Encoding {
    pub fn new(ids: Vec<TokenIdType>, offsets: Vec<(usize, usize)>) -> Result<Self, TokenizerError> {
        if ids.len() != offsets.len() {
            return Err(TokenizerError::Encode(format!(
                "token ids ({}) and offsets ({}) differ in length",
                ids.len(),
                offsets.len()
            )));
        }
        Ok(Self { ids, offsets })
    }

    pub fn token_ids(&self) -> &[TokenIdType] {
        &self.ids
    }

    pub fn offsets(&self) -> &[(usize, usize)] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Whether a tokenizer family wraps every encoding in boundary marker tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMarkers {
    /// One leading and one trailing marker (e.g. `[CLS]` ... `[SEP]`); both are dropped.
    #[default]
    Wrapped,
    /// No markers are injected; the encoding is returned as-is.
    None,
}

/// A loaded tokenizer instance.
pub trait Tokenizer: Send + Sync {
    /// Encode `text`, adding the family's special tokens, with character offsets.
    fn encode(&self, text: &str) -> Result<Encoding, TokenizerError>;

    /// Textual form of a token id, if it is in the vocabulary.
    fn id_to_token(&self, id: TokenIdType) -> Option<String>;

    fn vocab_size(&self) -> usize;

    fn boundary_markers(&self) -> BoundaryMarkers {
        BoundaryMarkers::Wrapped
    }
}
