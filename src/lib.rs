//! Tokenizer gateway: an HTTP service that tokenizes text with model-specific
//! tokenizers, keeping recently used tokenizers in a bounded in-memory cache.

pub mod protocols;
pub mod tokenizer;
pub mod tokenizer_service;

pub use tokenizer::{EncodingResult, TokenizationEngine, TokenizerCache};
pub use tokenizer_service::{TokenizerServer, TokenizerServiceConfig};
