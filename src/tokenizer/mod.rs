//! Tokenizer loading, caching, and tokenization.

pub mod cache;
pub mod engine;
pub mod error;
pub mod factory;
pub mod huggingface;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use cache::{CacheStats, TokenizerCache, DEFAULT_CACHE_CAPACITY};
pub use engine::{EncodingResult, TokenizationEngine};
pub use error::{LoadCause, LoadError, TokenizeError, TokenizerError};
pub use factory::{HubTokenizerLoader, TokenizerLoader};
pub use huggingface::HuggingFaceTokenizer;
pub use traits::{BoundaryMarkers, Encoding, TokenIdType, Tokenizer};
