//! Shared helpers for integration tests

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokenizer_gateway::{
    tokenizer::{Encoding, LoadCause, TokenIdType, Tokenizer, TokenizerError, TokenizerLoader},
    TokenizerServer, TokenizerServiceConfig,
};
use tower::ServiceExt;

pub const PANIC_TEXT: &str = "panic please";
pub const FAILING_TEXT: &str = "boom";

const VOCAB: &[&str] = &["[CLS]", "[SEP]", "[UNK]", "hello", "world", "the", "fox"];

/// One token per whitespace-separated word, wrapped in `[CLS]`/`[SEP]`
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> Result<Encoding, TokenizerError> {
        if text == PANIC_TEXT {
            panic!("tokenizer exploded");
        }
        if text == FAILING_TEXT {
            return Err(TokenizerError::Encode("cannot encode".to_string()));
        }

        let mut ids = vec![0];
        let mut offsets = vec![(0, 0)];
        let mut pos = 0;
        for word in text.split(' ') {
            let len = word.chars().count();
            if len > 0 {
                let id = VOCAB.iter().position(|v| *v == word).unwrap_or(2);
                ids.push(id as TokenIdType);
                offsets.push((pos, pos + len));
            }
            pos += len + 1;
        }
        ids.push(1);
        offsets.push((0, 0));
        Encoding::new(ids, offsets)
    }

    fn id_to_token(&self, id: TokenIdType) -> Option<String> {
        VOCAB.get(id as usize).map(|t| t.to_string())
    }

    fn vocab_size(&self) -> usize {
        VOCAB.len()
    }
}

/// Loader that knows every model except those starting with `missing/`
#[derive(Default)]
pub struct CountingLoader {
    loads: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingLoader {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            delay: Some(delay),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl TokenizerLoader for CountingLoader {
    fn load(
        &self,
        model_id: &str,
        _credential: Option<&str>,
    ) -> Result<Arc<dyn Tokenizer>, LoadCause> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if model_id.starts_with("missing/") {
            return Err(LoadCause::Hub(format!("{} not found", model_id)));
        }
        Ok(Arc::new(WordTokenizer))
    }
}

pub fn router_with(loader: Arc<dyn TokenizerLoader>, config: TokenizerServiceConfig) -> Router {
    TokenizerServer::with_loader(config, loader)
        .expect("valid config")
        .build_router()
}

pub fn tokenize_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/tokenize")
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

/// Send a request and return the status with the decoded JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, tokenize_request(body.to_string())).await
}

/// A body carries either `error` alone or the full tokenization result
pub fn assert_exclusive_shape(body: &Value) {
    let object = body.as_object().expect("response body is a JSON object");
    if object.contains_key("error") {
        assert_eq!(object.len(), 1, "error responses carry nothing else: {}", body);
    } else {
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["offsets", "token_count", "tokens"]);
    }
}
