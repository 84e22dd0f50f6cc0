//! API clients for the Fear & Greed index providers

pub mod alternative_me;
pub mod cnn;

use crate::config::BotConfig;
use crate::error::{BotError, FetchError, Result};
use crate::snapshot::{IndexSnapshot, Market};
use async_trait::async_trait;
use reqwest::Client;

/// Anything that can produce a fresh snapshot for a market
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexSource: Send + Sync {
    async fn fetch(&self, market: Market) -> std::result::Result<IndexSnapshot, FetchError>;
}

/// HTTP client for both providers
#[derive(Debug, Clone)]
pub struct FearGreedClient {
    client: Client,
    stock_url: String,
    crypto_url: String,
    crypto_limit: u32,
}

impl FearGreedClient {
    /// Build the client with the configured timeout and User-Agent
    pub fn new(config: &BotConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            stock_url: config.stock_api_url.clone(),
            crypto_url: config.crypto_api_url.clone(),
            crypto_limit: config.crypto_history_limit,
        })
    }

    /// GET the market's endpoint and return the body text
    async fn get_body(&self, market: Market) -> std::result::Result<String, FetchError> {
        let request = match market {
            Market::Stock => self.client.get(&self.stock_url),
            Market::Crypto => self
                .client
                .get(&self.crypto_url)
                .query(&[("limit", self.crypto_limit)]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_transport(market, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                market,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_transport(market, e))
    }
}

#[async_trait]
impl IndexSource for FearGreedClient {
    async fn fetch(&self, market: Market) -> std::result::Result<IndexSnapshot, FetchError> {
        tracing::debug!(%market, "Fetching fear & greed index");

        let result = self.get_body(market).await.and_then(|body| match market {
            Market::Stock => cnn::parse(&body),
            Market::Crypto => alternative_me::parse(&body),
        });

        match &result {
            Ok(snapshot) => {
                tracing::debug!(%market, score = snapshot.score, rating = %snapshot.rating, "Index fetched");
            }
            Err(e) => tracing::warn!(%market, error = %e, "Index fetch failed"),
        }

        result
    }
}
