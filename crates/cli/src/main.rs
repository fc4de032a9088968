#![forbid(unsafe_code)]

mod cli;
mod commands;

use std::path::Path;

use anyhow::{Context, Result};
use infrastructure::config::Settings;
use infrastructure::constants::DEFAULT_SETTINGS_PATH;
use infrastructure::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load(Path::new(path))
            .with_context(|| format!("failed to load settings {path}"))?,
        None if Path::new(DEFAULT_SETTINGS_PATH).exists() => {
            Settings::load(Path::new(DEFAULT_SETTINGS_PATH))
                .with_context(|| format!("failed to load settings {DEFAULT_SETTINGS_PATH}"))?
        }
        None => Settings::default(),
    };

    let level = cli.log_level.unwrap_or(settings.log.level);
    let format = cli.log_format.unwrap_or(settings.log.format);
    logging::init_logging(level, format);

    commands::run(cli.command, &settings).await
}
