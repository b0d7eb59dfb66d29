pub mod config;
mod metrics;
pub mod telegram;

use crate::bot::metrics::Metrics;
use crate::bot::telegram::{TelegramClient, TelegramError};
use crate::identifier::parse_identifier;
use crate::lookup::RecordSource;
use crate::reply::{self, Reply};
use std::time::Duration;

pub const BOT_VERSION: &str = env!("CARGO_PKG_VERSION");

const START_COMMAND: &str = "/start";
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Turns incoming chat text into replies. Knows nothing about the transport.
pub struct Bot<S> {
    source: S,
    version: String,
    metrics: Metrics,
}

impl<S: RecordSource> Bot<S> {
    pub fn new(source: S) -> Self {
        Bot {
            source,
            version: BOT_VERSION.to_string(),
            metrics: Metrics::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// `None` means the message gets no answer (unknown commands).
    pub fn handle_text(&self, text: &str) -> Option<Reply> {
        self.metrics.messages.increment(1);
        let text = text.trim();

        if text.starts_with('/') {
            return self.handle_command(text);
        }

        let identifier = match parse_identifier(text) {
            Ok(identifier) => identifier,
            Err(rejection) => {
                log::debug!("rejected identifier: {}", rejection.kind());
                self.metrics.record_rejection(&rejection);
                return Some(reply::rejection(&rejection));
            }
        };
        self.metrics.identifiers_accepted.increment(1);

        let outcome = self.source.lookup(&identifier);
        log::info!("lookup of {} -> {}", identifier, outcome.kind());
        self.metrics.record_lookup(&outcome);
        Some(reply::for_outcome(&identifier, &outcome))
    }

    fn handle_command(&self, text: &str) -> Option<Reply> {
        let command = text.split_whitespace().next().unwrap_or_default();
        // Group chats address commands as `/start@bot_name`
        let command = command.split('@').next().unwrap_or_default();
        match command {
            START_COMMAND => Some(reply::help(&self.version)),
            _ => None,
        }
    }
}

/// Fetches one batch of updates and answers every text message in it.
/// Returns the offset to poll with next.
pub fn poll_once<S: RecordSource>(
    client: &TelegramClient,
    bot: &Bot<S>,
    offset: Option<i64>,
) -> Result<Option<i64>, TelegramError> {
    let updates = client.get_updates(offset)?;
    let mut next_offset = offset;

    for update in updates {
        let acknowledged = update.update_id + 1;
        next_offset = Some(next_offset.map_or(acknowledged, |next| next.max(acknowledged)));

        let Some(message) = update.message else {
            continue;
        };
        let Some(reply) = message.text.as_deref().and_then(|text| bot.handle_text(text)) else {
            continue;
        };
        if let Err(err) = client.send_message(message.chat.id, &reply) {
            log::error!("failed to reply in chat {}: {}", message.chat.id, err);
        }
    }
    Ok(next_offset)
}

/// Polls forever. A failed poll is retried after a short delay.
pub fn run_polling<S: RecordSource>(client: &TelegramClient, bot: &Bot<S>) -> ! {
    let mut offset = None;
    loop {
        match poll_once(client, bot, offset) {
            Ok(next_offset) => offset = next_offset,
            Err(err) => {
                log::warn!("polling failed, retrying in {:?}: {}", RETRY_DELAY, err);
                std::thread::sleep(RETRY_DELAY);
            }
        }
    }
}
