//! Environment helpers shared by [SheetConfig](crate::SheetConfig) and
//! [BotConfig](crate::BotConfig). Both read their settings through a key lookup
//! function so tests can feed them without touching the process environment.

use std::num::NonZeroUsize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("one of {} must be set", .0.join(", "))]
    MissingOneOf(&'static [&'static str]),
}

/// Trimmed value of `name`, treating an empty value as unset.
pub(crate) fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}

pub(crate) fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match optional(lookup, name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            name,
            value,
            reason: "expected a non-negative integer",
        }),
    }
}

/// Parses a 1-based column number.
pub(crate) fn parse_column(name: &'static str, value: &str) -> Result<NonZeroUsize, ConfigError> {
    value
        .trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected a column number starting at 1",
        })
}

/// Parses a comma separated list of 1-based column numbers. Blank entries
/// (`"1,,3"`, trailing commas) are skipped.
pub(crate) fn parse_column_list(
    name: &'static str,
    value: &str,
) -> Result<Vec<NonZeroUsize>, ConfigError> {
    value
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| parse_column(name, entry))
        .collect()
}
