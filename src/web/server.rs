//! Webhook server using Axum.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::WebhookConfig;
use crate::core::{CommandRouter, Transport};
use crate::error::{Error, Result};

use super::router::{create_app_router, WebhookState};

/// Run the webhook server until the process is stopped.
pub async fn run_webhook_server(
    config: &WebhookConfig,
    router: Arc<CommandRouter>,
    transport: Arc<dyn Transport>,
) -> Result<()> {
    if config.secret_token.is_none() {
        tracing::warn!("webhook.secret_token is not set; any client can post updates");
    }

    let state = WebhookState {
        router,
        transport,
        secret_token: config.secret_token.as_deref().map(Arc::from),
    };
    let app = create_app_router(state, &config.path);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| Error::Web(format!("Invalid address: {}", e)))?;

    tracing::info!("Starting webhook server on {}{}", addr, config.path);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
