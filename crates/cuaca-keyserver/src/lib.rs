//! Same-origin endpoint that hands the weather API key to the client.
//!
//! `GET /api/key` returns `{"key": "..."}`. Other methods get a JSON 405, and
//! a server without a key answers 500.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

pub const KEY_ROUTE: &str = "/api/key";

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyBody {
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Clone, Default)]
pub struct KeyState {
    key: Option<String>,
}

impl KeyState {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }
}

impl std::fmt::Debug for KeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyState")
            .field("has_key", &self.has_key())
            .finish()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn issue_key(State(state): State<Arc<KeyState>>) -> Response {
    match &state.key {
        Some(key) => {
            tracing::debug!("Issued API key");
            Json(KeyBody { key: key.clone() }).into_response()
        }
        None => {
            tracing::error!("Key requested but no API key is configured");
            error(StatusCode::INTERNAL_SERVER_ERROR, "API key not configured")
        }
    }
}

async fn method_not_allowed() -> Response {
    error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Create the key route
pub fn routes(state: Arc<KeyState>) -> Router {
    Router::new()
        .route(KEY_ROUTE, get(issue_key).fallback(method_not_allowed))
        .with_state(state)
}
