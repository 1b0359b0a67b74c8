//! Telegram bot client - polling and webhook entry points.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::BotCommand;

use crate::config::Settings;
use crate::core::{CommandRouter, QueueStore, SystemClock};
use crate::error::{Error, Result};

use super::transport::{event_from_message, TelegramTransport};

/// Wire the router from settings. The queue starts empty.
pub fn build_router(settings: &Settings) -> Result<CommandRouter> {
    let router = CommandRouter::new(
        Arc::new(QueueStore::new()),
        settings.admin_set()?,
        settings.time_window()?,
        Arc::new(SystemClock),
    );

    if settings.maintenance {
        tracing::warn!("Maintenance mode enabled");
        return Ok(router.with_maintenance(settings.debug_chat()?));
    }
    Ok(router)
}

/// Create the bot, preferring an explicit token over the settings file.
pub fn create_bot(settings: &Settings, token: Option<String>) -> Result<Bot> {
    let token = token
        .or_else(|| settings.telegram.bot_token.clone())
        .ok_or_else(|| Error::Config("No bot token configured".to_string()))?;

    Ok(Bot::new(token))
}

/// Register the user-facing command menu. Failure is only logged.
pub async fn register_commands(bot: &Bot) {
    if let Err(e) = bot
        .set_my_commands(vec![
            BotCommand::new("start", "Introduction"),
            BotCommand::new("help", "Show help"),
            BotCommand::new("join", "Join the queue"),
            BotCommand::new("leave", "Leave the queue"),
            BotCommand::new("howlong", "Check your position"),
        ])
        .await
    {
        tracing::warn!("Failed to set commands: {}", e);
        return;
    }

    tracing::info!("Telegram bot commands set");
}

/// Run the telegram bot daemon using long polling.
pub async fn run_telegram_daemon(bot: Bot, router: Arc<CommandRouter>) -> Result<()> {
    tracing::info!("Starting Telegram bot (polling)...");

    register_commands(&bot).await;

    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    teloxide::repl(bot, move |_bot: Bot, msg: Message| {
        let router = Arc::clone(&router);
        let transport = Arc::clone(&transport);
        async move {
            let event = event_from_message(&msg);
            router.dispatch(&event, transport.as_ref()).await;
            respond(())
        }
    })
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChatIdValue, WindowConfig};
    use crate::core::{InboundEvent, ParticipantId, Reply};

    #[test]
    fn test_build_router_applies_admins() {
        let mut settings = Settings::default();
        settings
            .admins
            .insert("op".to_string(), ChatIdValue::Str("900".to_string()));

        let router = build_router(&settings).unwrap();
        assert!(router.is_admin(ParticipantId(900)));
        assert!(!router.is_admin(ParticipantId(1)));
    }

    #[test]
    fn test_build_router_maintenance() {
        let settings = Settings {
            maintenance: true,
            debug_chat_id: Some(ChatIdValue::Int(900)),
            ..Settings::default()
        };

        let router = build_router(&settings).unwrap();
        let routed = router.route(&InboundEvent::text(ParticipantId(1), None, "/join"));
        assert_eq!(routed.reply, Reply::UnderMaintenance);
        assert_eq!(routed.notices[0].recipient, ParticipantId(900));
    }

    #[test]
    fn test_build_router_rejects_bad_window() {
        let settings = Settings {
            window: WindowConfig {
                enabled: true,
                ..WindowConfig::default()
            },
            ..Settings::default()
        };
        assert!(build_router(&settings).is_err());
    }

    #[test]
    fn test_create_bot_requires_token() {
        assert!(create_bot(&Settings::default(), None).is_err());
        assert!(create_bot(&Settings::default(), Some("1:abc".to_string())).is_ok());
    }
}
