use strum::IntoStaticStr;
use thiserror::Error;

use crate::identifier::IDENTIFIER_LENGTH;

/// Why a piece of text was not accepted as an identifier. The [Display] output
/// is meant to be shown to the user as is.
///
/// [Display]: std::fmt::Display
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum IdentifierRejection {
    #[error("identifier must contain exactly {} digits", IDENTIFIER_LENGTH)]
    WrongLength { found: usize },

    #[error("check the identifier for a typo")]
    ChecksumMismatch,
}

impl IdentifierRejection {
    /// Stable name of the rejection kind, used as a metric label.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
