use anyhow::Context;
use sn_lookup::{
    run_polling, Bot, BotConfig, GoogleSheetsSource, SheetConfig, TelegramClient, BOT_VERSION,
};

fn main() -> anyhow::Result<()> {
    // Loaded first so `RUST_LOG` can come from the file too
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match dotenv {
        Ok(path) => log::info!("loaded settings from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => return Err(err).context("failed to read .env file"),
    }

    let bot_config = BotConfig::from_env().context("invalid bot configuration")?;
    let sheet_config = SheetConfig::from_env().context("invalid sheet configuration")?;
    log::info!(
        "sheet {:?}, identifier column {}, ignored columns {:?}",
        sheet_config.sheet_name(),
        sheet_config.layout().identifier_column(),
        sheet_config.layout().ignored_columns().collect::<Vec<_>>()
    );

    let source = GoogleSheetsSource::new(sheet_config).context("failed to create sheets client")?;
    let client = TelegramClient::new(&bot_config).context("failed to create Telegram client")?;
    let bot = Bot::new(source);

    log::info!("bot {} started", BOT_VERSION);
    run_polling(&client, &bot)
}
