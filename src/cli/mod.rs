//! CLI commands for QueueBot using clap.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_settings, Settings};
use crate::core::window::format_window_state;
use crate::logging::LogMode;
use crate::core::{Clock, FixedClock, SystemClock};
use crate::telegram::{build_router, client, TelegramTransport};
use crate::web::run_webhook_server;

/// QueueBot - Telegram waitlist bot.
#[derive(Parser)]
#[command(name = "queuebot")]
#[command(version)]
#[command(
    about = "QueueBot - join, leave and serve a single waitlist over Telegram",
    long_about = None
)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the bot
    Start {
        /// Settings file (defaults to ~/.queuebot/settings.json)
        #[arg(long, env = "QUEUEBOT_CONFIG")]
        config: Option<PathBuf>,

        /// Bot token, overrides telegram.bot_token
        #[arg(long, env = "QUEUEBOT_TELEGRAM_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Receive updates through the webhook server instead of polling
        #[arg(long)]
        webhook: bool,

        /// Directory for the rolling log file
        #[arg(long, env = "QUEUEBOT_LOG_DIR")]
        log_dir: Option<PathBuf>,
    },

    /// Validate settings and show whether the queue is open
    Check {
        /// Settings file (defaults to ~/.queuebot/settings.json)
        #[arg(long, env = "QUEUEBOT_CONFIG")]
        config: Option<PathBuf>,

        /// Evaluate the window at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

impl Commands {
    /// Logging wanted by the selected subcommand.
    pub fn log_mode(&self) -> LogMode {
        match &self.command {
            Command::Start { log_dir, .. } => LogMode::Service {
                dir: log_dir.clone(),
            },
            Command::Check { .. } => LogMode::Console,
        }
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Start {
                config,
                token,
                webhook,
                ..
            } => start(config, token, webhook).await,
            Command::Check { config, at } => check(config, at),
        }
    }
}

fn load(config: Option<PathBuf>) -> Result<Settings> {
    load_settings(config.as_deref()).context("Failed to load settings")
}

async fn start(config: Option<PathBuf>, token: Option<String>, webhook: bool) -> Result<()> {
    let settings = load(config)?;
    let router = Arc::new(build_router(&settings)?);
    let bot = client::create_bot(&settings, token)?;

    tracing::info!(
        "Queue ready: {} admin(s), window {}",
        settings.admins.len(),
        if settings.window.enabled { "enabled" } else { "disabled" }
    );

    if webhook {
        client::register_commands(&bot).await;
        let transport = Arc::new(TelegramTransport::new(bot));
        run_webhook_server(&settings.webhook, router, transport).await?;
    } else {
        client::run_telegram_daemon(bot, router).await?;
    }

    Ok(())
}

fn check(config: Option<PathBuf>, at: Option<DateTime<Utc>>) -> Result<()> {
    let settings = load(config)?;
    let clock: Box<dyn Clock> = match at {
        Some(instant) => Box::new(FixedClock(instant)),
        None => Box::new(SystemClock),
    };

    println!("{}", check_report(&settings, clock.as_ref())?);
    Ok(())
}

fn check_report(settings: &Settings, clock: &dyn Clock) -> Result<String> {
    let admins = settings.admin_set()?;
    let window = settings.time_window()?;
    let state = window.state(clock.now());

    let mut handles: Vec<&String> = admins.contacts().keys().collect();
    handles.sort();

    let mut out = String::from("Settings OK\n");
    out.push_str(&format!(
        "Admins: {} ({})\n",
        admins.len(),
        handles
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(&format!(
        "Token: {}\n",
        if settings.telegram.bot_token.is_some() { "set" } else { "not set" }
    ));
    out.push_str(&format!(
        "Maintenance: {}\n",
        if settings.maintenance { "on" } else { "off" }
    ));
    out.push_str(&format!(
        "Window: {}",
        if window.is_enabled() {
            format_window_state(&state)
        } else {
            "disabled (always open)".to_string()
        }
    ));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChatIdValue, WindowConfig};
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn parses_start_flags() {
        let argv = ["queuebot", "start", "--webhook", "--token", "1:x"];
        let args = Commands::try_parse_from(argv).unwrap();
        assert_eq!(args.log_mode(), LogMode::Service { dir: None });
        match args.command {
            Command::Start { webhook, token, .. } => {
                assert!(webhook);
                assert_eq!(token.as_deref(), Some("1:x"));
            }
            _ => panic!("expected start"),
        }
    }

    #[test]
    fn start_log_dir_selects_file_location() {
        let argv = ["queuebot", "start", "--log-dir", "/var/log/queuebot"];
        let args = Commands::try_parse_from(argv).unwrap();
        assert_eq!(
            args.log_mode(),
            LogMode::Service {
                dir: Some(PathBuf::from("/var/log/queuebot"))
            }
        );
    }

    #[test]
    fn parses_check_instant() {
        let argv = ["queuebot", "check", "--at", "2023-01-02T01:00:00Z"];
        let args = Commands::try_parse_from(argv).unwrap();
        assert_eq!(args.log_mode(), LogMode::Console);
        match args.command {
            Command::Check { at, .. } => {
                assert_eq!(at, Some(Utc.with_ymd_and_hms(2023, 1, 2, 1, 0, 0).unwrap()));
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn check_report_shows_window_state() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let mut settings = Settings {
            window: WindowConfig {
                enabled: true,
                start: Some(day.and_hms_opt(9, 0, 0).unwrap()),
                end: Some(day.and_hms_opt(17, 0, 0).unwrap()),
                ..WindowConfig::default()
            },
            ..Settings::default()
        };
        settings.admins.insert("op".to_string(), ChatIdValue::Int(1));

        let early = FixedClock(Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap());
        let report = check_report(&settings, &early).unwrap();
        assert!(report.contains("Admins: 1 (op)"));
        assert!(report.contains("not yet open"));

        let late = FixedClock(Utc.with_ymd_and_hms(2023, 1, 2, 12, 0, 0).unwrap());
        assert!(check_report(&settings, &late).unwrap().contains("closed"));
    }

    #[test]
    fn check_report_disabled_window() {
        let report = check_report(&Settings::default(), &SystemClock).unwrap();
        assert!(report.contains("disabled (always open)"));
        assert!(report.contains("Token: not set"));
    }
}
