//! Tokenizer Service module - HTTP front end for the tokenizer cache
//!
//! This module provides a standalone tokenizer service that:
//! 1. Receives `POST /api/tokenize` requests naming a model and a text
//! 2. Validates the request (both fields required, model name non-empty)
//! 3. Resolves the model's tokenizer through the shared LRU cache, loading it on a miss
//! 4. Returns tokens, token count, and character offsets with boundary markers removed
//!
//! # Architecture
//!
//! ```text
//! Client → Tokenizer Service → TokenizationEngine → TokenizerCache → TokenizerLoader
//! ```
//!
//! # Testing
//!
//! ## Unit Tests
//!
//! Run the tokenizer service unit tests:
//! ```bash
//! cargo test tokenizer_service --lib
//! ```
//!
//! The unit tests cover:
//! - Configuration defaults, builder pattern, and validation
//! - Error-to-message mapping for load, encoding, and panic failures
//!
//! Router-level behaviour (status codes, response shapes, concurrent requests)
//! is covered by the integration tests in `tests/`.
//!
//! ## Manual Testing
//!
//! 1. Start the service:
//!    ```bash
//!    HUGGINGFACE_API_TOKEN=hf_... cargo run -- --http-port 8080
//!    ```
//! 2. Send a request:
//!    ```bash
//!    curl -X POST http://localhost:8080/api/tokenize \
//!      -H "Content-Type: application/json" \
//!      -d '{"model-name": "bert-base-uncased", "text": "Hello world"}'
//!    ```

pub mod config;
pub mod handlers;
pub mod server;

pub use config::{ConfigError, TokenizerServiceConfig, DEFAULT_LOAD_TIMEOUT_MS};
pub use server::TokenizerServer;
