use crate::config::{self, ConfigError};
use crate::lookup::service_account::{AuthError, ServiceAccountKey};
use crate::lookup::table::TableLayout;
use reqwest::Url;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_SHEETS_TIMEOUT_SEC: u64 = 10;

pub const SHEET_ID: &str = "SHEET_ID";
pub const SHEET_NAME: &str = "SHEET_NAME";
pub const SERIAL_NUMBER_COLUMN: &str = "SERIAL_NUMBER_COLUMN";
pub const IGNORE_COLUMNS: &str = "IGNORE_COLUMNS";
pub const SHEET_PAT: &str = "SHEET_PAT";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const SHEET_API_KEY: &str = "SHEET_API_KEY";
pub const SHEET_ACCESS_TOKEN: &str = "SHEET_ACCESS_TOKEN";
pub const SHEET_API_URL: &str = "SHEET_API_URL";
pub const SHEET_TIMEOUT_SEC: &str = "SHEET_TIMEOUT_SEC";

const CREDENTIAL_VARIABLES: &[&str] = &[
    SHEET_PAT,
    GOOGLE_APPLICATION_CREDENTIALS,
    SHEET_API_KEY,
    SHEET_ACCESS_TOKEN,
];

#[derive(Clone, PartialEq, Eq)]
pub enum SheetCredentials {
    /// Service account key, exchanged for access tokens as needed.
    ServiceAccount(ServiceAccountKey),
    /// Sent in the `X-goog-api-key` header. Only works for sheets readable by link.
    ApiKey(String),
    /// OAuth access token sent as a bearer token. It is used as is and never
    /// refreshed.
    AccessToken(String),
}

// Keep secrets out of logs
impl std::fmt::Debug for SheetCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetCredentials::ServiceAccount(key) => {
                write!(f, "ServiceAccount({})", key.client_email())
            }
            SheetCredentials::ApiKey(_) => f.write_str("ApiKey(***)"),
            SheetCredentials::AccessToken(_) => f.write_str("AccessToken(***)"),
        }
    }
}

/// Settings of the spreadsheet holding the records. Always validated: the
/// only ways to get one are [SheetConfigBuilder::build] and the env readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    sheet_id: String,
    sheet_name: String,
    layout: TableLayout,
    credentials: SheetCredentials,
    endpoint: Url,
    timeout: Duration,
}

impl SheetConfig {
    pub fn builder(
        sheet_id: impl Into<String>,
        credentials: SheetCredentials,
    ) -> SheetConfigBuilder {
        SheetConfigBuilder::new(sheet_id.into(), credentials)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let sheet_id = config::required(&lookup, SHEET_ID)?;

        let credentials = credentials_from_lookup(&lookup)?;

        let mut builder = SheetConfig::builder(sheet_id, credentials);
        if let Some(name) = config::optional(&lookup, SHEET_NAME) {
            builder.set_sheet_name(name);
        }
        if let Some(column) = config::optional(&lookup, SERIAL_NUMBER_COLUMN) {
            builder.set_identifier_column(config::parse_column(SERIAL_NUMBER_COLUMN, &column)?);
        }
        if let Some(columns) = config::optional(&lookup, IGNORE_COLUMNS) {
            builder.set_ignore_columns(config::parse_column_list(IGNORE_COLUMNS, &columns)?);
        }
        if let Some(endpoint) = config::optional(&lookup, SHEET_API_URL) {
            builder.set_endpoint(endpoint);
        }
        builder.set_timeout(Duration::from_secs(config::parse_u64(
            &lookup,
            SHEET_TIMEOUT_SEC,
            DEFAULT_SHEETS_TIMEOUT_SEC,
        )?));
        builder.build()
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn credentials(&self) -> &SheetCredentials {
        &self.credentials
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

pub struct SheetConfigBuilder {
    sheet_id: String,
    sheet_name: String,
    identifier_column: NonZeroUsize,
    ignore_columns: Vec<NonZeroUsize>,
    credentials: SheetCredentials,
    endpoint: String,
    timeout: Duration,
}

impl SheetConfigBuilder {
    pub fn new(sheet_id: String, credentials: SheetCredentials) -> Self {
        SheetConfigBuilder {
            sheet_id,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            identifier_column: NonZeroUsize::MIN,
            ignore_columns: vec![],
            credentials,
            endpoint: DEFAULT_SHEETS_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_SHEETS_TIMEOUT_SEC),
        }
    }
    pub fn set_sheet_name(&mut self, sheet_name: impl Into<String>) -> &mut Self {
        self.sheet_name = sheet_name.into();
        self
    }
    pub fn set_identifier_column(&mut self, identifier_column: NonZeroUsize) -> &mut Self {
        self.identifier_column = identifier_column;
        self
    }
    pub fn set_ignore_columns(&mut self, ignore_columns: Vec<NonZeroUsize>) -> &mut Self {
        self.ignore_columns = ignore_columns;
        self
    }
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.endpoint = endpoint.into();
        self
    }
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }
    pub fn build(&self) -> Result<SheetConfig, ConfigError> {
        let sheet_id = self.sheet_id.trim();
        if sheet_id.is_empty() {
            return Err(ConfigError::Missing(SHEET_ID));
        }
        let sheet_name = self.sheet_name.trim();
        if sheet_name.is_empty() {
            return Err(invalid(SHEET_NAME, sheet_name, "sheet name must not be empty"));
        }
        if let SheetCredentials::ApiKey(secret) | SheetCredentials::AccessToken(secret) =
            &self.credentials
        {
            if secret.trim().is_empty() {
                return Err(ConfigError::MissingOneOf(CREDENTIAL_VARIABLES));
            }
        }
        let endpoint = Url::parse(&self.endpoint)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
            .ok_or_else(|| invalid(SHEET_API_URL, &self.endpoint, "expected an http(s) url"))?;
        if self.timeout.is_zero() {
            return Err(invalid(
                SHEET_TIMEOUT_SEC,
                "0",
                "timeout must be at least one second",
            ));
        }

        Ok(SheetConfig {
            sheet_id: sheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            layout: TableLayout::new(self.identifier_column)
                .ignore_columns(self.ignore_columns.iter().copied()),
            credentials: self.credentials.clone(),
            endpoint,
            timeout: self.timeout,
        })
    }
}

// The first credential set wins: `SHEET_PAT` (a key file path or the key JSON
// itself), `GOOGLE_APPLICATION_CREDENTIALS` (a key file path), then the API
// key and the access token.
fn credentials_from_lookup(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<SheetCredentials, ConfigError> {
    if let Some(value) = config::optional(lookup, SHEET_PAT) {
        let key = if Path::new(&value).is_file() {
            read_key_file(SHEET_PAT, &value)?
        } else {
            // Never echo the value, it may be the key itself
            ServiceAccountKey::from_json(&value)
                .map_err(|err| invalid(SHEET_PAT, "***", key_error_reason(&err)))?
        };
        return Ok(SheetCredentials::ServiceAccount(key));
    }
    if let Some(path) = config::optional(lookup, GOOGLE_APPLICATION_CREDENTIALS) {
        let key = read_key_file(GOOGLE_APPLICATION_CREDENTIALS, &path)?;
        return Ok(SheetCredentials::ServiceAccount(key));
    }
    if let Some(key) = config::optional(lookup, SHEET_API_KEY) {
        return Ok(SheetCredentials::ApiKey(key));
    }
    if let Some(token) = config::optional(lookup, SHEET_ACCESS_TOKEN) {
        return Ok(SheetCredentials::AccessToken(token));
    }
    Err(ConfigError::MissingOneOf(CREDENTIAL_VARIABLES))
}

fn read_key_file(name: &'static str, path: &str) -> Result<ServiceAccountKey, ConfigError> {
    let json = std::fs::read_to_string(path)
        .map_err(|_| invalid(name, path, "service account key file could not be read"))?;
    ServiceAccountKey::from_json(&json).map_err(|err| invalid(name, path, key_error_reason(&err)))
}

fn key_error_reason(err: &AuthError) -> &'static str {
    match err {
        AuthError::InvalidPrivateKey(_) => "private_key is not an RSA key in PEM format",
        _ => "expected a service account key file or its JSON",
    }
}

fn invalid(name: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lookup::service_account::test::key_json;
    use std::collections::HashMap;
    use std::io::Write;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<SheetConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SheetConfig::from_lookup(|name| map.get(name).cloned())
    }

    fn key_file(token_uri: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(key_json(token_uri).as_bytes()).unwrap();
        file
    }

    fn column(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn defaults() {
        let config = from_pairs(&[(SHEET_ID, "abc"), (SHEET_API_KEY, "key")]).unwrap();
        assert_eq!(config.sheet_id(), "abc");
        assert_eq!(config.sheet_name(), "Sheet1");
        assert_eq!(config.layout(), &TableLayout::default());
        assert_eq!(config.credentials(), &SheetCredentials::ApiKey("key".to_string()));
        assert_eq!(config.endpoint().as_str(), "https://sheets.googleapis.com/");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn all_options() {
        let config = from_pairs(&[
            (SHEET_ID, " abc "),
            (SHEET_NAME, "Devices"),
            (SERIAL_NUMBER_COLUMN, "3"),
            (IGNORE_COLUMNS, "1, 4,"),
            (SHEET_ACCESS_TOKEN, "token"),
            (SHEET_API_URL, "http://localhost:8080"),
            (SHEET_TIMEOUT_SEC, "2"),
        ])
        .unwrap();
        assert_eq!(config.sheet_id(), "abc");
        assert_eq!(config.sheet_name(), "Devices");
        assert_eq!(
            config.layout(),
            &TableLayout::new(column(3)).ignore_columns([column(1), column(4)])
        );
        assert_eq!(
            config.credentials(),
            &SheetCredentials::AccessToken("token".to_string())
        );
        assert_eq!(config.endpoint().as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn api_key_wins_over_access_token() {
        let config = from_pairs(&[
            (SHEET_ID, "abc"),
            (SHEET_API_KEY, "key"),
            (SHEET_ACCESS_TOKEN, "token"),
        ])
        .unwrap();
        assert_eq!(config.credentials(), &SheetCredentials::ApiKey("key".to_string()));
    }

    #[test]
    fn service_account_from_inline_json() {
        let json = key_json("http://localhost/token");
        let config = from_pairs(&[
            (SHEET_ID, "abc"),
            (SHEET_PAT, json.as_str()),
            (SHEET_API_KEY, "key"),
        ])
        .unwrap();
        assert_eq!(
            config.credentials(),
            &SheetCredentials::ServiceAccount(ServiceAccountKey::from_json(&json).unwrap())
        );
    }

    #[test]
    fn service_account_from_file() {
        let file = key_file("http://localhost/token");
        let path = file.path().to_str().unwrap();
        let expected = SheetCredentials::ServiceAccount(
            ServiceAccountKey::from_json(&key_json("http://localhost/token")).unwrap(),
        );

        let config = from_pairs(&[(SHEET_ID, "abc"), (SHEET_PAT, path)]).unwrap();
        assert_eq!(config.credentials(), &expected);

        let config =
            from_pairs(&[(SHEET_ID, "abc"), (GOOGLE_APPLICATION_CREDENTIALS, path)]).unwrap();
        assert_eq!(config.credentials(), &expected);
    }

    #[test]
    fn sheet_pat_wins_over_application_credentials() {
        let json = key_json("http://localhost/first");
        let file = key_file("http://localhost/second");
        let config = from_pairs(&[
            (SHEET_ID, "abc"),
            (SHEET_PAT, json.as_str()),
            (GOOGLE_APPLICATION_CREDENTIALS, file.path().to_str().unwrap()),
        ])
        .unwrap();
        match config.credentials() {
            SheetCredentials::ServiceAccount(key) => {
                assert_eq!(key.token_uri(), "http://localhost/first")
            }
            other => panic!("unexpected credentials {other:?}"),
        }
    }

    #[test]
    fn invalid_service_account() {
        match from_pairs(&[(SHEET_ID, "abc"), (SHEET_PAT, "{\"private_key\": \"secret\"}")]) {
            Err(ConfigError::InvalidValue { name, value, .. }) => {
                assert_eq!(name, SHEET_PAT);
                assert_eq!(value, "***");
            }
            other => panic!("unexpected result {other:?}"),
        }

        let missing = from_pairs(&[
            (SHEET_ID, "abc"),
            (GOOGLE_APPLICATION_CREDENTIALS, "/nonexistent/key.json"),
        ]);
        assert!(matches!(
            missing,
            Err(ConfigError::InvalidValue {
                name: GOOGLE_APPLICATION_CREDENTIALS,
                ..
            })
        ));
    }

    #[test]
    fn missing_settings() {
        assert_eq!(
            from_pairs(&[(SHEET_API_KEY, "key")]),
            Err(ConfigError::Missing(SHEET_ID))
        );
        assert_eq!(
            from_pairs(&[(SHEET_ID, "abc")]),
            Err(ConfigError::MissingOneOf(CREDENTIAL_VARIABLES))
        );
    }

    #[test]
    fn invalid_settings() {
        let base = [(SHEET_ID, "abc"), (SHEET_API_KEY, "key")];
        for (name, value) in [
            (SERIAL_NUMBER_COLUMN, "0"),
            (SERIAL_NUMBER_COLUMN, "first"),
            (IGNORE_COLUMNS, "2,zero"),
            (SHEET_API_URL, "not a url"),
            (SHEET_API_URL, "ftp://example.com"),
            (SHEET_TIMEOUT_SEC, "0"),
            (SHEET_TIMEOUT_SEC, "soon"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push((name, value));
            match from_pairs(&pairs) {
                Err(ConfigError::InvalidValue { name: got, .. }) => assert_eq!(got, name),
                other => panic!("{name}={value} gave {other:?}"),
            }
        }
    }

    #[test]
    fn credentials_are_not_printed() {
        let config = from_pairs(&[(SHEET_ID, "abc"), (SHEET_API_KEY, "secret-key")]).unwrap();
        assert!(!format!("{config:?}").contains("secret-key"));

        let json = key_json("http://localhost/token");
        let config = from_pairs(&[(SHEET_ID, "abc"), (SHEET_PAT, json.as_str())]).unwrap();
        let printed = format!("{config:?}");
        assert!(printed.contains("bot@serials.iam.gserviceaccount.com"));
        assert!(!printed.contains("PRIVATE KEY"));
    }
}
