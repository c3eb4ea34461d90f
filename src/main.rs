use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tokenizer_gateway::{
    tokenizer::{BoundaryMarkers, DEFAULT_CACHE_CAPACITY},
    tokenizer_service::DEFAULT_LOAD_TIMEOUT_MS,
    TokenizerServer, TokenizerServiceConfig,
};
use tracing_subscriber::EnvFilter;

/// HTTP service that tokenizes text with HuggingFace tokenizers
#[derive(Parser, Debug)]
#[command(name = "tokenizer-gateway", version)]
struct Cli {
    /// Host to bind
    #[arg(long, env = "TOKENIZER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP port
    #[arg(long, env = "TOKENIZER_HTTP_PORT", default_value_t = 8080)]
    http_port: u16,

    /// Max tokenizers kept in memory
    #[arg(long, env = "TOKENIZER_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Fail tokenizer loads that take longer than this many milliseconds (0 disables the limit)
    #[arg(long, env = "TOKENIZER_LOAD_TIMEOUT_MS", default_value_t = DEFAULT_LOAD_TIMEOUT_MS)]
    load_timeout_ms: u64,

    /// HuggingFace access token (falls back to HF_TOKEN)
    #[arg(long, env = "HUGGINGFACE_API_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Directory for downloaded tokenizer files
    #[arg(long, env = "TOKENIZER_HUB_CACHE_DIR")]
    hub_cache_dir: Option<PathBuf>,

    /// Return every token, including leading and trailing boundary markers
    #[arg(long)]
    keep_boundary_tokens: bool,

    /// Max concurrent tokenize requests
    #[arg(long, default_value_t = 1000)]
    max_concurrent_requests: usize,

    /// Disable per-request logging
    #[arg(long)]
    quiet_requests: bool,
}

impl Cli {
    fn into_config(self) -> TokenizerServiceConfig {
        let hf_token = self.hf_token.or_else(|| std::env::var("HF_TOKEN").ok());
        let boundary_markers = if self.keep_boundary_tokens {
            BoundaryMarkers::None
        } else {
            BoundaryMarkers::Wrapped
        };

        let mut config = TokenizerServiceConfig::new()
            .with_host(self.host)
            .with_http_port(self.http_port)
            .with_cache_capacity(self.cache_capacity)
            .with_hf_token(hf_token)
            .with_boundary_markers(boundary_markers)
            .with_max_concurrent_requests(self.max_concurrent_requests)
            .with_log_requests(!self.quiet_requests);
        config = match self.load_timeout_ms {
            0 => config.without_load_timeout(),
            timeout => config.with_load_timeout_ms(timeout),
        };
        if let Some(dir) = self.hub_cache_dir {
            config = config.with_hub_cache_dir(dir);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();
    let server = TokenizerServer::new(config).map_err(|e| anyhow!(e))?;
    server.serve().await.map_err(|e| anyhow!(e))?;
    Ok(())
}
