//! Telegram side of the transport seam.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Message;

use crate::core::{InboundEvent, MessageBody, ParticipantId, Transport};
use crate::error::Result;

/// Sends replies through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(&self, recipient: ParticipantId, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(recipient.0), text).await?;
        Ok(())
    }
}

/// Convert a Telegram message into a router event.
///
/// The chat id is the participant identity since replies go back to the
/// chat. The label prefers `@username` and falls back to the full name.
pub fn event_from_message(msg: &Message) -> InboundEvent {
    let label = msg.from.as_ref().map(|user| match &user.username {
        Some(username) => format!("@{}", username),
        None => user.full_name(),
    });

    let body = match msg.text() {
        Some(text) => MessageBody::Text(text.to_string()),
        None => MessageBody::Unsupported(media_kind(msg).to_string()),
    };

    InboundEvent {
        sender: ParticipantId(msg.chat.id.0),
        label,
        body,
    }
}

fn media_kind(msg: &Message) -> &'static str {
    if msg.photo().is_some() {
        "photo"
    } else if msg.sticker().is_some() {
        "sticker"
    } else if msg.document().is_some() {
        "document"
    } else if msg.voice().is_some() {
        "voice"
    } else if msg.video().is_some() {
        "video"
    } else if msg.audio().is_some() {
        "audio"
    } else if msg.location().is_some() {
        "location"
    } else {
        "other"
    }
}
