//! Configuration for the Tokenizer Service

use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tokenizer::{BoundaryMarkers, DEFAULT_CACHE_CAPACITY};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache capacity must be at least 1")]
    ZeroCacheCapacity,

    #[error("max concurrent requests must be at least 1")]
    ZeroConcurrency,

    #[error("load timeout must be at least 1ms")]
    ZeroLoadTimeout,
}

/// Configuration for the Tokenizer Service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerServiceConfig {
    /// Host to bind the tokenizer service
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port for the tokenizer service
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Max tokenizers kept in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Give up on a tokenizer load after this many milliseconds (no limit if unset)
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: Option<u64>,

    /// HuggingFace access token passed to the loader
    #[serde(default, skip_serializing)]
    pub hf_token: Option<String>,

    /// Override for the hf-hub download cache directory
    #[serde(default)]
    pub hub_cache_dir: Option<PathBuf>,

    /// Whether loaded tokenizers wrap encodings in boundary markers
    #[serde(default)]
    pub boundary_markers: BoundaryMarkers,

    /// Enable request logging
    #[serde(default = "default_true")]
    pub log_requests: bool,

    /// Max concurrent tokenize requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

/// Default limit on a single tokenizer load
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_load_timeout_ms() -> Option<u64> {
    Some(DEFAULT_LOAD_TIMEOUT_MS)
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_requests() -> usize {
    1000
}

impl Default for TokenizerServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            cache_capacity: default_cache_capacity(),
            load_timeout_ms: default_load_timeout_ms(),
            hf_token: None,
            hub_cache_dir: None,
            boundary_markers: BoundaryMarkers::default(),
            log_requests: default_true(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl TokenizerServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set host
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Builder pattern: set HTTP port
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Builder pattern: set cache capacity
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Builder pattern: set load timeout
    pub fn with_load_timeout_ms(mut self, timeout: u64) -> Self {
        self.load_timeout_ms = Some(timeout);
        self
    }

    /// Builder pattern: let tokenizer loads run without a time limit
    pub fn without_load_timeout(mut self) -> Self {
        self.load_timeout_ms = None;
        self
    }

    /// Builder pattern: set HuggingFace token
    pub fn with_hf_token(mut self, token: Option<String>) -> Self {
        self.hf_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Builder pattern: set hub cache directory
    pub fn with_hub_cache_dir(mut self, dir: PathBuf) -> Self {
        self.hub_cache_dir = Some(dir);
        self
    }

    /// Builder pattern: set boundary marker handling
    pub fn with_boundary_markers(mut self, boundary_markers: BoundaryMarkers) -> Self {
        self.boundary_markers = boundary_markers;
        self
    }

    /// Builder pattern: set max concurrent requests
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Builder pattern: toggle request logging
    pub fn with_log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache_capacity()?;
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.load_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroLoadTimeout);
        }
        Ok(())
    }

    pub fn cache_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.cache_capacity).ok_or(ConfigError::ZeroCacheCapacity)
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    /// Get the HTTP bind address
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}
