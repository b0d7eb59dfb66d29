pub mod config;
pub mod google_sheets;
pub mod service_account;
pub mod table;

use crate::identifier::CanonicalIdentifier;
use strum::IntoStaticStr;

/// Fields of a looked up row, in the column order of the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Record { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Record::new(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum LookupOutcome {
    Found(Record),
    NotFound,
    /// The source could not be searched. The reason is meant for the user.
    #[strum(serialize = "failed")]
    LookupFailed(String),
}

impl LookupOutcome {
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

pub trait RecordSource: Send + Sync {
    fn lookup(&self, identifier: &CanonicalIdentifier) -> LookupOutcome;
}
