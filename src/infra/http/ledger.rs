use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::info;

use crate::{
    application::{error::HttpError, generator::GenerateError},
    cache::DocumentCache,
    domain::settings::LedgerSettings,
};

use super::middleware::{log_requests, log_responses, set_request_context};

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";
const RESET_PARAM: &str = "reset";

/// Process-wide state shared with every request handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: LedgerSettings,
    pub cache: Arc<DocumentCache>,
}

impl AppState {
    pub fn new(settings: LedgerSettings, cache: Arc<DocumentCache>) -> Self {
        Self { settings, cache }
    }

    /// Generate and cache the ledger before any request arrives.
    pub async fn prime(&self) -> Result<Arc<str>, GenerateError> {
        self.cache.get(&self.settings).await
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_ledger))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(log_requests))
        .layer(middleware::from_fn(set_request_context))
}

/// Whether `reset` appears in the query, with or without a value.
fn wants_reset(pairs: &[(String, String)]) -> bool {
    pairs.iter().any(|(key, _)| key == RESET_PARAM)
}

async fn serve_ledger(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    if wants_reset(&pairs) {
        info!(
            target = "beancount_example::http::ledger",
            "Reset requested; clearing cached ledger"
        );
        state.cache.clear();
    }

    match state.cache.get(&state.settings).await {
        Ok(document) => (
            StatusCode::OK,
            [(CONTENT_TYPE, PLAIN_TEXT)],
            document.to_string(),
        )
            .into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn reset_key_presence_is_enough() {
        assert!(wants_reset(&pairs(&[("reset", "")])));
        assert!(wants_reset(&pairs(&[("reset", ""), ("reset", "1")])));
        assert!(wants_reset(&pairs(&[("other", "x"), ("reset", "no")])));
        assert!(!wants_reset(&pairs(&[("resets", "1"), ("other", "reset")])));
        assert!(!wants_reset(&[]));
    }
}
