mod error;

pub use crate::identifier::error::IdentifierRejection;
use crate::secondary_validation::{extract_digits, validate_checksum};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const IDENTIFIER_LENGTH: usize = 12;
pub const GROUP_LENGTH: usize = 4;
pub const GROUP_SEPARATOR: char = '-';

/// A checksum-valid 12 digit identifier, kept in its `XXXX-XXXX-XXXX` display form.
///
/// The only way to build one is [parse_identifier] (or [FromStr], which calls it).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalIdentifier {
    formatted: String,
}

impl CanonicalIdentifier {
    // `digits` must already be IDENTIFIER_LENGTH ascii digits
    fn from_digits(digits: &str) -> Self {
        let mut formatted = String::with_capacity(IDENTIFIER_LENGTH + 2);
        for (i, group) in digits.as_bytes().chunks(GROUP_LENGTH).enumerate() {
            if i > 0 {
                formatted.push(GROUP_SEPARATOR);
            }
            formatted.extend(group.iter().map(|b| char::from(*b)));
        }
        CanonicalIdentifier { formatted }
    }

    pub fn as_str(&self) -> &str {
        &self.formatted
    }

    /// The bare digits, without separators.
    pub fn digits(&self) -> String {
        extract_digits(&self.formatted)
    }
}

impl fmt::Display for CanonicalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted)
    }
}

impl FromStr for CanonicalIdentifier {
    type Err = IdentifierRejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_identifier(s)
    }
}

impl Serialize for CanonicalIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.formatted)
    }
}

/// Turns free-form user text into a [CanonicalIdentifier].
///
/// Every ascii digit of `raw_text` is kept, in order, and everything else is
/// dropped regardless of where it appears. The digits must number exactly
/// [IDENTIFIER_LENGTH] (checked first) and pass the Luhn checksum.
pub fn parse_identifier(raw_text: &str) -> Result<CanonicalIdentifier, IdentifierRejection> {
    let digits = extract_digits(raw_text);

    if digits.len() != IDENTIFIER_LENGTH {
        return Err(IdentifierRejection::WrongLength {
            found: digits.len(),
        });
    }
    if !validate_checksum(&digits) {
        return Err(IdentifierRejection::ChecksumMismatch);
    }
    Ok(CanonicalIdentifier::from_digits(&digits))
}
