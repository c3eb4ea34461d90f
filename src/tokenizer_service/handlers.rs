//! Request handlers for the Tokenizer Service
//!
//! Handlers validate the request, run it through the [`TokenizationEngine`],
//! and map engine outcomes onto status codes. Every response body carries either
//! `error` or the tokenization result, never both.

use std::{any::Any, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    protocols::tokenize::{
        ErrorResponse, TokenizeRequest, TokenizeResponse, ENCODING_ERROR_MESSAGE,
        UNEXPECTED_ERROR_MESSAGE,
    },
    tokenizer::{TokenizationEngine, TokenizeError},
};

/// Shared state for handlers
pub struct HandlerState {
    pub engine: TokenizationEngine,
    /// Bounds the number of requests encoding at once
    pub request_limiter: Semaphore,
    pub log_requests: bool,
}

impl HandlerState {
    pub fn new(engine: TokenizationEngine, max_concurrent_requests: usize, log_requests: bool) -> Self {
        Self {
            engine,
            request_limiter: Semaphore::new(max_concurrent_requests),
            log_requests,
        }
    }
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<HandlerState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "cache": state.engine.cache().stats(),
        })),
    )
}

/// Liveness probe
pub async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Tokenize endpoint
pub async fn tokenize_handler(State(state): State<Arc<HandlerState>>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let (model_id, text) = match TokenizeRequest::from_slice(&body).and_then(|r| r.validate()) {
        Ok(fields) => fields,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Rejected tokenize request");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    if state.log_requests {
        info!(
            request_id = %request_id,
            model_id = %model_id,
            text_chars = text.chars().count(),
            "Processing tokenize request"
        );
    }

    let outcome = match state.engine.tokenizer(&model_id).await {
        Ok(tokenizer) => {
            // Requests waiting on a tokenizer load hold no permit.
            let _permit = match state.request_limiter.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(request_id = %request_id, error = %e, "Request limiter closed");
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        UNEXPECTED_ERROR_MESSAGE,
                    );
                }
            };
            state.engine.encode(&model_id, tokenizer.as_ref(), &text)
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => {
            debug!(
                request_id = %request_id,
                model_id = %model_id,
                token_count = result.token_count,
                "Tokenize request complete"
            );
            (StatusCode::OK, Json(TokenizeResponse::from(result))).into_response()
        }
        Err(e) => {
            error!(
                request_id = %request_id,
                model_id = %e.model_id(),
                error = %e,
                "Tokenize request failed"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, tokenize_error_message(&e))
        }
    }
}

/// User-facing message for a failed tokenization
fn tokenize_error_message(e: &TokenizeError) -> String {
    match e {
        TokenizeError::LoadFailed(load) => load.to_string(),
        TokenizeError::EncodingFailed { .. } => ENCODING_ERROR_MESSAGE.to_string(),
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Response for a panic caught while handling a request
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(error = %detail, "Unexpected error");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR_MESSAGE)
}
