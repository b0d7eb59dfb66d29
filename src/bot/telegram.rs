use crate::bot::config::BotConfig;
use crate::reply::Reply;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// Extra time the HTTP client waits on top of the long-poll timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("invalid Telegram API url")]
    InvalidEndpoint,

    #[error("error making HTTP request: {0}")]
    Http(reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Telegram API error: {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

// Method urls contain the bot token, keep them out of error messages
impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        TelegramError::Http(err.without_url())
    }
}

/// Blocking client for the two Bot API methods the bot needs.
pub struct TelegramClient {
    client: Client,
    api_url: Url,
    token: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(config.poll_timeout() + POLL_GRACE)
            .build()?;
        Ok(TelegramClient {
            client,
            api_url: config.api_url().clone(),
            token: config.token().to_string(),
            poll_timeout: config.poll_timeout(),
        })
    }

    fn method_url(&self, method: &str) -> Result<Url, TelegramError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| TelegramError::InvalidEndpoint)?
            .pop_if_empty()
            .push(&format!("bot{}", self.token))
            .push(method);
        Ok(url)
    }

    fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        // Failed calls still come back as JSON with `ok: false`, whatever the status
        let response = self.client.post(self.method_url(method)?).json(body).send()?;
        let text = response.text()?;
        let response: ApiResponse<T> = serde_json::from_str(&text)?;
        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api {
                code: response.error_code,
                description: response
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    /// Long-polls for new messages. Every update below `offset` is
    /// acknowledged by the server and won't be delivered again.
    pub fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout.as_secs(),
                allowed_updates: ["message"],
            },
        )
    }

    pub fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        let _sent: serde_json::Value = self.call(
            "sendMessage",
            &SendMessage {
                chat_id,
                text: &reply.text,
                parse_mode: reply.markdown.then_some("Markdown"),
            },
        )?;
        Ok(())
    }
}
