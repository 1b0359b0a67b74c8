//! Configuration loading for QueueBot.
//!
//! Settings live in `~/.queuebot/settings.json` unless a path is given.
//! They are read once at startup and never change afterwards.

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::{AdminSet, ParticipantId, TimeWindow};
use crate::error::{Error, Result};

/// Get the QueueBot home directory (~/.queuebot).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".queuebot"))
}

/// Get the default settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from `path`, or from the default location.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => get_settings_path()?,
    };

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    settings.admin_set()?;
    settings.time_window()?;
    settings.debug_chat()?;

    if settings.admins.is_empty() {
        tracing::warn!("No admins configured; operator commands are unreachable");
    }
    if settings.maintenance && settings.debug_chat_id.is_none() {
        tracing::warn!("Maintenance mode is on but no debug_chat_id is set");
    }
    Ok(())
}

/// A chat id written either as a number or as a string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChatIdValue {
    Int(i64),
    Str(String),
}

impl ChatIdValue {
    pub fn to_participant_id(&self) -> Result<ParticipantId> {
        match self {
            ChatIdValue::Int(id) => Ok(ParticipantId(*id)),
            ChatIdValue::Str(raw) => raw
                .trim()
                .parse::<i64>()
                .map(ParticipantId)
                .map_err(|_| Error::Config(format!("'{}' is not a valid chat id", raw))),
        }
    }
}

/// Telegram channel configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
}

/// Opening hours. Times are local wall-clock in `timezone`, an IANA name.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WindowConfig {
    #[serde(default)]
    pub enabled: bool,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "Asia/Singapore".to_string()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start: None,
            end: None,
            timezone: default_timezone(),
        }
    }
}

impl WindowConfig {
    pub fn to_window(&self) -> Result<TimeWindow> {
        if !self.enabled {
            return Ok(TimeWindow::disabled());
        }

        let (start, end) = match (self.start, self.end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(Error::Config(
                    "window.start and window.end are required when the window is enabled"
                        .to_string(),
                ))
            }
        };

        let tz: Tz = self
            .timezone
            .parse()
            .map_err(|_| Error::Config(format!("Unknown window.timezone '{}'", self.timezone)))?;

        TimeWindow::from_local(start, end, tz)
    }
}

/// Webhook listener configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_host")]
    pub host: String,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
    #[serde(default = "default_webhook_path")]
    pub path: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`; updates without it are dropped.
    #[serde(default)]
    pub secret_token: Option<String>,
}

fn default_webhook_host() -> String {
    "0.0.0.0".to_string()
}

fn default_webhook_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: default_webhook_host(),
            port: default_webhook_port(),
            path: default_webhook_path(),
            secret_token: None,
        }
    }
}

/// QueueBot settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Handle -> chat id of every operator.
    #[serde(default)]
    pub admins: HashMap<String, ChatIdValue>,

    /// Where maintenance mode forwards incoming events.
    #[serde(default)]
    pub debug_chat_id: Option<ChatIdValue>,

    #[serde(default)]
    pub maintenance: bool,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Settings {
    pub fn admin_set(&self) -> Result<AdminSet> {
        let contacts = self
            .admins
            .iter()
            .map(|(handle, id)| Ok((handle.clone(), id.to_participant_id()?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(AdminSet::new(contacts))
    }

    pub fn time_window(&self) -> Result<TimeWindow> {
        self.window.to_window()
    }

    pub fn debug_chat(&self) -> Result<Option<ParticipantId>> {
        self.debug_chat_id
            .as_ref()
            .map(ChatIdValue::to_participant_id)
            .transpose()
    }
}
