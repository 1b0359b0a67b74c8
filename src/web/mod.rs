//! Webhook server module (Axum).

pub mod router;
pub mod server;

pub use router::{create_app_router, WebhookState};
pub use server::run_webhook_server;
