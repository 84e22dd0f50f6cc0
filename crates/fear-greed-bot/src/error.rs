//! Error types for fetching, delivering and configuring the bot

use crate::snapshot::Market;
use bot_utils::EnvError;
use thiserror::Error;

/// Failure reading an index from an upstream provider
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("{market} index request timed out")]
    Timeout { market: Market },

    /// Connection, TLS or body transfer failure
    #[error("{market} index request failed: {source}")]
    Network {
        market: Market,
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success status
    #[error("{market} index provider returned HTTP {status}")]
    Status { market: Market, status: u16 },

    /// Body could not be mapped onto a snapshot
    #[error("malformed {market} index response: {reason}")]
    Malformed { market: Market, reason: String },
}

impl FetchError {
    /// Classify a transport error, separating timeouts from other failures
    pub fn from_transport(market: Market, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout { market }
        } else {
            FetchError::Network { market, source }
        }
    }

    pub fn malformed(market: Market, reason: impl Into<String>) -> Self {
        FetchError::Malformed {
            market,
            reason: reason.into(),
        }
    }

    pub fn market(&self) -> Market {
        match self {
            FetchError::Timeout { market }
            | FetchError::Network { market, .. }
            | FetchError::Status { market, .. }
            | FetchError::Malformed { market, .. } => *market,
        }
    }

    /// Short Chinese description of the failure cause
    pub fn reason(&self) -> String {
        match self {
            FetchError::Timeout { .. } => "请求超时".to_string(),
            FetchError::Network { .. } => "网络错误".to_string(),
            FetchError::Status { status, .. } => format!("HTTP 状态码 {status}"),
            FetchError::Malformed { .. } => "数据格式异常".to_string(),
        }
    }

    /// Message shown to the chat user
    pub fn user_message(&self) -> String {
        format!(
            "无法获取{}数据，请稍后重试（{}）",
            self.market().display_name(),
            self.reason()
        )
    }
}

/// Failure talking to the chat transport
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP-level failure reaching the Bot API
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Bot API answered `ok: false`
    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    /// Bot API answered with something that is not a valid envelope
    #[error("unexpected Bot API response: {0}")]
    UnexpectedResponse(String),
}

// Bot API URLs embed the token, so it is stripped before the error is kept
impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Transport(err.without_url())
    }
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input that is not one of the bot's commands
    #[error("Unknown command: {0}")]
    Command(String),
}

impl From<EnvError> for BotError {
    fn from(err: EnvError) -> Self {
        BotError::Config(err.to_string())
    }
}

/// Result type alias for bot operations
pub type Result<T> = std::result::Result<T, BotError>;
