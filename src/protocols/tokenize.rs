//! Wire types for `POST /api/tokenize`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tokenizer::EncodingResult;

/// Message returned for any generic server-side failure
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Message returned when a loaded tokenizer fails on the request text
pub const ENCODING_ERROR_MESSAGE: &str = "An error occurred while tokenizing the text";

/// Client-side problems with a tokenize request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Both 'model-name' and 'text' are required")]
    MissingFields,
}

/// Request body. Fields are optional on the wire so missing ones can be
/// reported with a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenizeRequest {
    #[serde(rename = "model-name", default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TokenizeRequest {
    /// Parse a raw body. Anything that is not a JSON object with string
    /// fields is treated as missing fields.
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(body).map_err(|_| ValidationError::MissingFields)
    }

    /// Returns `(model_name, text)`. The model name must be non-empty; the
    /// text may be empty.
    pub fn validate(self) -> Result<(String, String), ValidationError> {
        match (self.model_name, self.text) {
            (Some(model_name), Some(text)) if !model_name.is_empty() => Ok((model_name, text)),
            _ => Err(ValidationError::MissingFields),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeResponse {
    pub token_count: usize,
    pub tokens: Vec<String>,
    pub offsets: Vec<(usize, usize)>,
}

impl From<EncodingResult> for TokenizeResponse {
    fn from(result: EncodingResult) -> Self {
        Self {
            token_count: result.token_count,
            tokens: result.tokens,
            offsets: result.offsets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
