//! QueueBot - Telegram waitlist bot.
//!
//! This is the main entry point.

use clap::Parser;
use std::process::ExitCode;

use queuebot::{logging, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args = Commands::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = match logging::init(&args.log_mode()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
