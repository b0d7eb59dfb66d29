use crate::identifier::CanonicalIdentifier;
use crate::lookup::config::{SheetConfig, SheetCredentials};
use crate::lookup::service_account::{AuthError, ServiceAccountTokens};
use crate::lookup::table::find_record;
use crate::lookup::{LookupOutcome, RecordSource};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("invalid sheets endpoint {0}")]
    InvalidEndpoint(Url),

    #[error("error making HTTP request: {0}")]
    Http(reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("unexpected HTTP status code {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

// The request url can carry credentials, so it never ends up in the message
impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        SheetsError::Http(err.without_url())
    }
}

impl SheetsError {
    /// Short description of the failure that is safe to show to chat users.
    /// The full error only goes to the log.
    pub fn user_reason(&self) -> String {
        match self {
            SheetsError::InvalidEndpoint(_) | SheetsError::Auth(_) => {
                "the spreadsheet is not configured correctly".to_string()
            }
            SheetsError::Http(_) => "the spreadsheet service could not be reached".to_string(),
            SheetsError::Status(code) => {
                format!("the spreadsheet service answered with status {code}")
            }
            SheetsError::Decode(_) => {
                "the spreadsheet service returned an unexpected response".to_string()
            }
        }
    }
}

// Body of `GET /v4/spreadsheets/{id}/values/{range}`. An empty sheet has no
// `values` at all.
#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

enum Authorization {
    ApiKey(String),
    Bearer(String),
    ServiceAccount(ServiceAccountTokens),
}

/// Reads the whole sheet through the Google Sheets v4 values API on every
/// lookup, so edits to the sheet are visible immediately.
pub struct GoogleSheetsSource {
    config: SheetConfig,
    client: Client,
    authorization: Authorization,
}

impl GoogleSheetsSource {
    pub fn new(config: SheetConfig) -> Result<Self, SheetsError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let authorization = match config.credentials() {
            SheetCredentials::ServiceAccount(key) => {
                Authorization::ServiceAccount(ServiceAccountTokens::new(key.clone())?)
            }
            SheetCredentials::ApiKey(key) => Authorization::ApiKey(key.clone()),
            SheetCredentials::AccessToken(token) => Authorization::Bearer(token.clone()),
        };
        Ok(GoogleSheetsSource {
            config,
            client,
            authorization,
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    fn values_url(&self) -> Result<Url, SheetsError> {
        let range = a1_sheet_range(self.config.sheet_name());
        let mut url = self.config.endpoint().clone();
        url.path_segments_mut()
            .map_err(|()| SheetsError::InvalidEndpoint(self.config.endpoint().clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.config.sheet_id(), "values", range.as_str()]);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, SheetsError> {
        Ok(match &self.authorization {
            Authorization::ApiKey(key) => request.header(API_KEY_HEADER, key),
            Authorization::Bearer(token) => request.bearer_auth(token),
            Authorization::ServiceAccount(tokens) => {
                request.bearer_auth(tokens.access_token(&self.client)?)
            }
        })
    }

    /// All rows of the sheet, header row first. Cells that aren't strings
    /// are rendered with their JSON text, `null` becomes an empty string.
    pub fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        let request = self.authorize(self.client.get(self.values_url()?))?;

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SheetsError::Status(status.as_u16()));
        }
        let body = response.text()?;
        let range: ValueRange = serde_json::from_str(&body)?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

/// A1 range covering a whole sheet. The name is always quoted so names like
/// `Q1` or `Sales!2024` aren't read as cell references.
fn a1_sheet_range(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl RecordSource for GoogleSheetsSource {
    fn lookup(&self, identifier: &CanonicalIdentifier) -> LookupOutcome {
        match self.fetch_rows() {
            Ok(rows) => {
                log::debug!(
                    "fetched {} rows from sheet {:?}",
                    rows.len(),
                    self.config.sheet_name()
                );
                find_record(&rows, self.config.layout(), identifier)
            }
            Err(err) => {
                log::warn!("sheet lookup failed: {}", err);
                LookupOutcome::LookupFailed(err.user_reason())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::identifier::parse_identifier;
    use crate::lookup::service_account::test::key_json;
    use crate::lookup::service_account::ServiceAccountKey;
    use crate::lookup::Record;
    use crate::reply;
    use crate::secondary_validation::complete_checksum;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;
    use std::time::Duration;

    const SHEET_PATH: &str = "/v4/spreadsheets/sheet-id/values/'Devices'";

    fn source(server: &MockServer, credentials: SheetCredentials) -> GoogleSheetsSource {
        let config = SheetConfig::builder("sheet-id", credentials)
            .set_sheet_name("Devices")
            .set_endpoint(server.base_url())
            .set_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        GoogleSheetsSource::new(config).unwrap()
    }

    fn unreachable_source(credentials: SheetCredentials) -> GoogleSheetsSource {
        let config = SheetConfig::builder("abc", credentials)
            .set_endpoint("http://127.0.0.1:1")
            .set_timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        GoogleSheetsSource::new(config).unwrap()
    }

    fn id() -> CanonicalIdentifier {
        parse_identifier(&complete_checksum("12345678901")).unwrap()
    }

    #[test]
    fn finds_record_with_api_key() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(SHEET_PATH)
                .header(API_KEY_HEADER, "api-key");
            then.status(200).json_body(json!({
                "range": "Devices!A1:C3",
                "majorDimension": "ROWS",
                "values": [
                    ["Serial", "Model", "Count"],
                    ["0000-0000-0000", "X0", 1],
                    [id().to_string(), "X1", 42, null]
                ]
            }));
        });

        let credentials = SheetCredentials::ApiKey("api-key".to_string());
        let outcome = source(&server, credentials).lookup(&id());
        mock.assert();

        let expected: Record = [("Model", "X1"), ("Count", "42")].into_iter().collect();
        assert_eq!(outcome, LookupOutcome::Found(expected));
    }

    #[test]
    fn sends_access_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(SHEET_PATH)
                .header("authorization", "Bearer token");
            then.status(200).json_body(json!({ "range": "Devices!A1:Z1000" }));
        });

        let outcome =
            source(&server, SheetCredentials::AccessToken("token".to_string())).lookup(&id());
        mock.assert();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[test]
    fn service_account_token_is_minted_and_reused() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .x_www_form_urlencoded_key_exists("assertion");
            then.status(200)
                .json_body(json!({ "access_token": "ya29.minted", "expires_in": 3599 }));
        });
        let sheet = server.mock(|when, then| {
            when.method(GET)
                .path(SHEET_PATH)
                .header("authorization", "Bearer ya29.minted");
            then.status(200).json_body(json!({
                "values": [["Serial", "Model"], [id().to_string(), "X9"]]
            }));
        });

        let key = ServiceAccountKey::from_json(&key_json(&server.url("/token"))).unwrap();
        let source = source(&server, SheetCredentials::ServiceAccount(key));
        for _ in 0..2 {
            let expected: Record = [("Model", "X9")].into_iter().collect();
            assert_eq!(source.lookup(&id()), LookupOutcome::Found(expected));
        }
        token.assert_hits(1);
        sheet.assert_hits(2);
    }

    #[test]
    fn failed_token_request_is_a_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(401)
                .json_body(json!({ "error": "invalid_client" }));
        });
        let sheet = server.mock(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({}));
        });

        let key = ServiceAccountKey::from_json(&key_json(&server.url("/token"))).unwrap();
        let outcome = source(&server, SheetCredentials::ServiceAccount(key)).lookup(&id());
        sheet.assert_hits(0);
        assert_eq!(
            outcome,
            LookupOutcome::LookupFailed("the spreadsheet is not configured correctly".to_string())
        );
    }

    #[test]
    fn error_status_is_a_failure_not_a_miss() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET);
            then.status(403).body("forbidden");
        });

        let outcome = source(&server, SheetCredentials::ApiKey("bad".to_string())).lookup(&id());
        mock.assert();
        assert_eq!(
            outcome,
            LookupOutcome::LookupFailed(
                "the spreadsheet service answered with status 403".to_string()
            )
        );
    }

    #[test]
    fn undecodable_body_is_a_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(200).body("<html>");
        });

        let outcome = source(&server, SheetCredentials::ApiKey("key".to_string())).lookup(&id());
        assert_eq!(
            outcome,
            LookupOutcome::LookupFailed(
                "the spreadsheet service returned an unexpected response".to_string()
            )
        );
    }

    #[test]
    fn unreachable_server_is_a_failure() {
        let source = unreachable_source(SheetCredentials::ApiKey("key".to_string()));
        assert_eq!(
            source.lookup(&id()),
            LookupOutcome::LookupFailed("the spreadsheet service could not be reached".to_string())
        );
    }

    #[test]
    fn credentials_never_reach_errors_or_replies() {
        for credentials in [
            SheetCredentials::ApiKey("SUPERSECRETKEY".to_string()),
            SheetCredentials::AccessToken("SUPERSECRETKEY".to_string()),
        ] {
            let source = unreachable_source(credentials);

            let err = source.fetch_rows().unwrap_err();
            assert!(matches!(err, SheetsError::Http(_)), "{err:?}");
            assert!(!err.to_string().contains("SUPERSECRETKEY"), "{err}");
            assert!(!format!("{err:?}").contains("SUPERSECRETKEY"), "{err:?}");

            let outcome = source.lookup(&id());
            let text = reply::for_outcome(&id(), &outcome).text;
            assert!(!text.contains("SUPERSECRETKEY"), "{text}");
            assert!(!text.contains("127.0.0.1"), "{text}");
        }
    }

    #[test]
    fn values_url_keeps_endpoint_path() {
        let config = SheetConfig::builder("abc", SheetCredentials::ApiKey("k".to_string()))
            .set_endpoint("http://proxy.local/sheets/")
            .build()
            .unwrap();
        let source = GoogleSheetsSource::new(config).unwrap();
        assert_eq!(
            source.values_url().unwrap().as_str(),
            "http://proxy.local/sheets/v4/spreadsheets/abc/values/'Sheet1'"
        );
    }

    #[test]
    fn sheet_names_are_quoted() {
        assert_eq!(a1_sheet_range("Q1"), "'Q1'");
        assert_eq!(a1_sheet_range("Sales!2024"), "'Sales!2024'");
        assert_eq!(a1_sheet_range("Bob's devices"), "'Bob''s devices'");
    }
}
