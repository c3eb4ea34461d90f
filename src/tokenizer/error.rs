//! Error types for tokenizer loading and tokenization

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use super::traits::TokenIdType;

/// Failure inside a loaded tokenizer while processing text
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("Tokenization error: {0}")]
    Encode(String),

    #[error("Token id {0} has no vocabulary entry")]
    UnknownTokenId(TokenIdType),
}

/// Why a tokenizer could not be produced for a model identifier
#[derive(Debug, Clone, Error)]
pub enum LoadCause {
    #[error("model identifier is empty")]
    EmptyModelId,

    #[error("no tokenizer found at {0}")]
    NotFound(String),

    #[error("hub download failed: {0}")]
    Hub(String),

    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    #[error("invalid tokenizer definition: {0}")]
    InvalidTokenizer(String),

    #[error("load timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("load task aborted: {0}")]
    Aborted(String),
}

impl From<std::io::Error> for LoadCause {
    fn from(e: std::io::Error) -> Self {
        LoadCause::Io(Arc::new(e))
    }
}

/// The loader could not produce a tokenizer for `model_id`
#[derive(Debug, Clone, Error)]
#[error("Error loading the tokenizer for model '{model_id}'")]
pub struct LoadError {
    pub model_id: String,
    #[source]
    pub cause: LoadCause,
}

impl LoadError {
    pub fn new(model_id: impl Into<String>, cause: LoadCause) -> Self {
        Self {
            model_id: model_id.into(),
            cause,
        }
    }
}

/// Failure of a tokenize request
#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error(transparent)]
    LoadFailed(#[from] LoadError),

    #[error("Error tokenizing text with model '{model_id}'")]
    EncodingFailed {
        model_id: String,
        #[source]
        cause: TokenizerError,
    },
}

impl TokenizeError {
    pub fn model_id(&self) -> &str {
        match self {
            TokenizeError::LoadFailed(e) => &e.model_id,
            TokenizeError::EncodingFailed { model_id, .. } => model_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_load_error_message_names_model() {
        let err = LoadError::new("org/missing", LoadCause::Hub("404".to_string()));
        assert_eq!(
            err.to_string(),
            "Error loading the tokenizer for model 'org/missing'"
        );
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("hub download failed: 404"));
    }

    #[test]
    fn test_io_cause_keeps_source() {
        let err = LoadError::new(
            "local/model",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into(),
        );
        let shared = err.clone();
        assert!(matches!(shared.cause, LoadCause::Io(_)));
        let cause = shared.source().and_then(|c| c.source()).map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("denied"));
    }

    #[test]
    fn test_timeout_cause_message() {
        let cause = LoadCause::Timeout(Duration::from_millis(1500));
        assert_eq!(cause.to_string(), "load timed out after 1500ms");
    }

    #[test]
    fn test_tokenize_error_model_id() {
        let load: TokenizeError = LoadError::new("a", LoadCause::EmptyModelId).into();
        assert_eq!(load.model_id(), "a");
        assert_eq!(load.to_string(), "Error loading the tokenizer for model 'a'");

        let encode = TokenizeError::EncodingFailed {
            model_id: "b".to_string(),
            cause: TokenizerError::UnknownTokenId(42),
        };
        assert_eq!(encode.model_id(), "b");
        assert!(matches!(encode, TokenizeError::EncodingFailed { .. }));
    }
}
