//! Route definitions for the webhook server.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use teloxide::types::{Update, UpdateKind};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::core::{CommandRouter, Transport};
use crate::telegram::event_from_message;

/// Largest update body accepted.
const MAX_UPDATE_BYTES: usize = 1024 * 1024;

/// Header Telegram echoes back from `setWebhook(secret_token)`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared handler state.
#[derive(Clone)]
pub struct WebhookState {
    pub router: Arc<CommandRouter>,
    pub transport: Arc<dyn Transport>,
    /// When set, updates must carry it in [`SECRET_TOKEN_HEADER`].
    pub secret_token: Option<Arc<str>>,
}

impl WebhookState {
    fn is_authentic(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.secret_token.as_deref() else {
            return true;
        };
        headers
            .get(SECRET_TOKEN_HEADER)
            .map_or(false, |got| got.as_bytes() == expected.as_bytes())
    }
}

/// Create the full app router with the webhook mounted at `path`.
pub fn create_app_router(state: WebhookState, path: &str) -> Router {
    Router::new()
        .route(path, post(telegram_webhook))
        .route("/health", get(health_check))
        .layer(RequestBodyLimitLayer::new(MAX_UPDATE_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Telegram update endpoint.
///
/// Always answers 200 so Telegram does not redeliver updates the bot
/// cannot use. Updates without the configured secret are dropped unrouted.
async fn telegram_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !state.is_authentic(&headers) {
        tracing::warn!("Dropping webhook update with missing or wrong secret token");
        return StatusCode::OK;
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!("Ignoring unparseable update: {}", e);
            return StatusCode::OK;
        }
    };

    match update.kind {
        UpdateKind::Message(msg) => {
            let event = event_from_message(&msg);
            state.router.dispatch(&event, state.transport.as_ref()).await;
        }
        _ => {
            tracing::info!("Update carries no message, ignoring");
        }
    }

    StatusCode::OK
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
