//! QueueBot library root.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod telegram;
pub mod web;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use crate::core::{CommandRouter, InboundEvent, QueueStore, Reply, Transport};
pub use error::{Error, Result};
pub use telegram::run_telegram_daemon;
pub use web::run_webhook_server;
