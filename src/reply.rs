//! User facing texts. Everything marked as Markdown targets Telegram's legacy
//! `Markdown` parse mode.

use crate::identifier::{CanonicalIdentifier, IdentifierRejection};
use crate::lookup::{LookupOutcome, Record};

pub const FAILURE_INDICATOR: &str = "❌";
pub const SUCCESS_INDICATOR: &str = "✅";
pub const NO_DATA: &str = "No data found";

/// A message to send back, and whether it must be parsed as Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markdown: bool,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            markdown: false,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            markdown: true,
        }
    }
}

pub fn help(version: &str) -> Reply {
    Reply::markdown(format!(
        "👋 Welcome!\n\n\
         This bot looks up product information by identifier.\n\n\
         *How to use:*\n\
         • Send an identifier as text and the bot will find its record in the database.\n\
         • If the identifier is malformed or unknown, you will get an error message instead.\n\n\
         /start - show these instructions\n\n\
         Bot version: {}\n",
        escape_markdown(version)
    ))
}

pub fn rejection(reason: &IdentifierRejection) -> Reply {
    Reply::plain(format!("{FAILURE_INDICATOR} {reason}"))
}

pub fn not_found(identifier: &CanonicalIdentifier) -> Reply {
    Reply::plain(format!(
        "{FAILURE_INDICATOR} Identifier {identifier} was not found in the database."
    ))
}

pub fn lookup_failed(reason: &str) -> Reply {
    Reply::plain(format!(
        "{FAILURE_INDICATOR} An error occurred while looking up data: {reason}"
    ))
}

pub fn found(identifier: &CanonicalIdentifier, record: &Record) -> Reply {
    Reply::markdown(format!(
        "{SUCCESS_INDICATOR} *Identifier:* {identifier}\n\n{}",
        format_record(record)
    ))
}

pub fn for_outcome(identifier: &CanonicalIdentifier, outcome: &LookupOutcome) -> Reply {
    match outcome {
        LookupOutcome::Found(record) => found(identifier, record),
        LookupOutcome::NotFound => not_found(identifier),
        LookupOutcome::LookupFailed(reason) => lookup_failed(reason),
    }
}

/// One bold field name and its value per block. Fields with an empty value
/// are left out.
pub fn format_record(record: &Record) -> String {
    let blocks: Vec<String> = record
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| format!("*{}*\n{}", escape_markdown(field), escape_markdown(value)))
        .collect();

    if blocks.is_empty() {
        NO_DATA.to_string()
    } else {
        blocks.join("\n\n")
    }
}

pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
