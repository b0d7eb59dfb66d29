// This blocks accidental use of `println`. If one is actually needed, you can
// override with `#[allow(clippy::print_stdout)]`.
#![deny(clippy::print_stdout)]

mod bot;
mod config;
mod identifier;
mod lookup;
mod reply;
mod secondary_validation;

// This is the public API of the serial number lookup library
pub use bot::config::BotConfig;
pub use bot::telegram::{Chat, Message, TelegramClient, TelegramError, Update};
pub use bot::{poll_once, run_polling, Bot, BOT_VERSION};
pub use config::ConfigError;
pub use identifier::{
    parse_identifier, CanonicalIdentifier, IdentifierRejection, GROUP_LENGTH, GROUP_SEPARATOR,
    IDENTIFIER_LENGTH,
};
pub use lookup::config::{SheetConfig, SheetConfigBuilder, SheetCredentials};
pub use lookup::google_sheets::{GoogleSheetsSource, SheetsError};
pub use lookup::service_account::{AuthError, ServiceAccountKey, ServiceAccountTokens};
pub use lookup::table::{find_record, StaticTable, TableLayout};
pub use lookup::{LookupOutcome, Record, RecordSource};
pub use reply::{format_record, Reply};
pub use secondary_validation::{
    complete_checksum, compute_checksum, extract_digits, validate_checksum, LuhnChecksum,
    Validator,
};
