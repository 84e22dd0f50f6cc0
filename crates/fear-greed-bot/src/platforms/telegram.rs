//! Telegram Bot API transport
//!
//! Outbound messages go through [`TelegramClient`] as a [`Messenger`];
//! inbound commands arrive via `getUpdates` long polling.

use crate::bot::FearGreedBot;
use crate::config::BotConfig;
use crate::error::{BotError, DeliveryError, Result};
use crate::interface::{ChatId, MessageId, Messenger, ParseMode, SendOptions};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pause after a failed poll
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> std::result::Result<T, DeliveryError> {
        if !self.ok {
            return Err(DeliveryError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        self.result.ok_or_else(|| {
            DeliveryError::UnexpectedResponse("ok response without result".to_string())
        })
    }
}

#[derive(Debug, Serialize)]
struct LinkPreviewOptions {
    is_disabled: bool,
}

#[derive(Debug, Serialize)]
struct SendMessageParams<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link_preview_options: Option<LinkPreviewOptions>,
}

impl<'a> SendMessageParams<'a> {
    fn new(chat_id: ChatId, text: &'a str, options: SendOptions) -> Self {
        Self {
            chat_id,
            text,
            parse_mode: options.parse_mode,
            link_preview_options: options
                .disable_link_preview
                .then_some(LinkPreviewOptions { is_disabled: true }),
        }
    }
}

#[derive(Debug, Serialize)]
struct DeleteMessageParams {
    chat_id: ChatId,
    message_id: MessageId,
}

#[derive(Debug, Serialize)]
struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

/// One entry of a `getUpdates` result
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: MessageId,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

impl Update {
    /// Chat and text of a text message, if this update carries one
    pub fn text_message(&self) -> Option<(ChatId, &str)> {
        let message = self.message.as_ref()?;
        Some((message.chat.id, message.text.as_deref()?))
    }
}

/// Client for the Telegram Bot API
pub struct TelegramClient {
    client: reqwest::Client,
    endpoint: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// Create a client from configuration
    pub fn new(config: &BotConfig) -> Result<Self> {
        // Long polls hold the connection for up to `poll_timeout`
        let client = reqwest::Client::builder()
            .timeout(config.poll_timeout + config.request_timeout)
            .build()
            .map_err(|e| BotError::Config(format!("failed to build Telegram client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", config.telegram_api_base, config.telegram_token),
            poll_timeout: config.poll_timeout,
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> std::result::Result<R, DeliveryError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .json(params)
            .send()
            .await?;

        // Errors come back as a JSON envelope with a non-2xx status
        let status = response.status();
        let body = response.text().await?;
        decode_envelope(&body)
            .map_err(|e| match e {
                DeliveryError::UnexpectedResponse(reason) => {
                    DeliveryError::UnexpectedResponse(format!("{method} (HTTP {status}): {reason}"))
                }
                other => other,
            })
    }

    /// Fetch pending updates starting at `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> std::result::Result<Vec<Update>, DeliveryError> {
        let params = GetUpdatesParams {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &params).await
    }

    /// Long-poll for commands until the task is cancelled.
    ///
    /// Every text message is handled on its own task so a slow fetch never
    /// blocks the poll loop.
    pub async fn run_polling(&self, bot: Arc<FearGreedBot>) {
        let mut offset = None;
        info!(timeout_secs = self.poll_timeout.as_secs(), "Polling for updates");

        loop {
            let updates = match self.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed; retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            offset = next_offset(offset, &updates);

            for update in updates {
                let Some((chat_id, text)) = update.text_message() else {
                    debug!(update_id = update.update_id, "Skipping non-text update");
                    continue;
                };
                let text = text.to_string();
                let bot = Arc::clone(&bot);

                tokio::spawn(async move {
                    if let Err(e) = bot.handle_text(chat_id, &text).await {
                        error!(%chat_id, error = %e, "Failed to handle message");
                    }
                });
            }
        }
    }
}

fn decode_envelope<R: DeserializeOwned>(body: &str) -> std::result::Result<R, DeliveryError> {
    serde_json::from_str::<ApiResponse<R>>(body)
        .map_err(|e| DeliveryError::UnexpectedResponse(e.to_string()))?
        .into_result()
}

/// Offset acknowledging every update in `updates`
fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| Some(current.map_or(next, |c| c.max(next))))
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: SendOptions,
    ) -> std::result::Result<MessageId, DeliveryError> {
        let params = SendMessageParams::new(chat_id, text, options);
        let sent: SentMessage = self.call("sendMessage", &params).await?;
        debug!(%chat_id, message_id = sent.message_id.0, "Message sent");
        Ok(sent.message_id)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> std::result::Result<(), DeliveryError> {
        let params = DeleteMessageParams { chat_id, message_id };
        let _deleted: bool = self.call("deleteMessage", &params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_ok_envelope() {
        let body = r#"{"ok":true,"result":{"message_id":77,"chat":{"id":1},"date":0}}"#;
        let sent: SentMessage = decode_envelope(body).unwrap();
        assert_eq!(sent.message_id, MessageId(77));
    }

    #[test]
    fn test_decode_error_envelope() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        let err = decode_envelope::<SentMessage>(body).unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Api { code: 400, ref description } if description.contains("chat not found")
        ));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_envelope::<bool>("<html>502</html>"),
            Err(DeliveryError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            decode_envelope::<bool>(r#"{"ok":true}"#),
            Err(DeliveryError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_decode_updates() {
        let body = json!({
            "ok": true,
            "result": [
                {
                    "update_id": 10,
                    "message": {
                        "message_id": 5,
                        "date": 1_704_067_200,
                        "chat": {"id": -100_123, "type": "group"},
                        "text": "/stock@fear_greed_bot"
                    }
                },
                {
                    "update_id": 11,
                    "message": {
                        "message_id": 6,
                        "date": 1_704_067_201,
                        "chat": {"id": 42, "type": "private"},
                        "sticker": {}
                    }
                },
                {"update_id": 12, "edited_message": {}}
            ]
        })
        .to_string();

        let updates: Vec<Update> = decode_envelope(&body).unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(
            updates[0].text_message(),
            Some((ChatId(-100_123), "/stock@fear_greed_bot"))
        );
        assert_eq!(updates[1].text_message(), None);
        assert_eq!(updates[2].text_message(), None);
        assert_eq!(next_offset(None, &updates), Some(13));
    }

    #[test]
    fn test_next_offset_without_updates_keeps_current() {
        assert_eq!(next_offset(None, &[]), None);
        assert_eq!(next_offset(Some(8), &[]), Some(8));
    }

    #[test]
    fn test_send_message_params() {
        let params = SendMessageParams::new(
            ChatId(42),
            "<b>hi</b>",
            SendOptions::html().without_link_preview(),
        );
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "chat_id": 42,
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "link_preview_options": {"is_disabled": true}
            })
        );

        let plain = SendMessageParams::new(ChatId(42), "⏳", SendOptions::plain());
        assert_eq!(
            serde_json::to_value(&plain).unwrap(),
            json!({"chat_id": 42, "text": "⏳"})
        );
    }

    #[test]
    fn test_client_endpoint() {
        let config = BotConfig::builder()
            .telegram_token("123:abc")
            .chat_id(ChatId(1))
            .telegram_api_base("http://127.0.0.1:9/")
            .build()
            .unwrap();
        let client = TelegramClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://127.0.0.1:9/bot123:abc");
        assert_eq!(client.poll_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_transport_errors_do_not_leak_token() {
        let config = BotConfig::builder()
            .telegram_token("123456:SECRET-TOKEN")
            .chat_id(ChatId(1))
            .telegram_api_base("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = TelegramClient::new(&config).unwrap();

        let err = client
            .send_message(ChatId(1), "hi", SendOptions::plain())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));

        let mut logged = format!("{err} {err:?}");
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            logged.push_str(&format!(" {cause}"));
            source = cause.source();
        }
        assert!(!logged.contains("SECRET-TOKEN"), "{logged}");

        let err = BotError::from(client.get_updates(None).await.unwrap_err());
        assert!(!err.to_string().contains("SECRET-TOKEN"));
    }
}
