//! Telegram bot integration.

pub mod client;
pub mod transport;

pub use client::{build_router, run_telegram_daemon};
pub use transport::{event_from_message, TelegramTransport};
