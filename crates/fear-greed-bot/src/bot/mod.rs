//! Fear & Greed bot
//!
//! Routes inbound commands and scheduled pushes through the same
//! fetch → format → send path.
//!
//! # Request lifecycle
//!
//! `Idle → Fetching → {Formatting → Sent} | Failed`. A command first gets a
//! "⏳" placeholder, which is deleted once the report (or the error reply) has
//! been sent. Scheduled pushes skip the placeholder, and a failed scheduled
//! fetch is only logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use fear_greed_bot::bot::FearGreedBot;
//!
//! let bot = FearGreedBot::new(source, messenger, formatter);
//! bot.handle_text(chat_id, "/both").await?;
//! ```

pub mod commands;

use crate::api::IndexSource;
use crate::error::{FetchError, Result};
use crate::interface::{ChatId, MessageFormatter, Messenger, SendOptions};
use crate::snapshot::Market;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub use commands::{COMMANDS, Command, Query};

/// What caused a report to be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A user command
    Manual,
    /// A scheduler job
    Scheduled,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Manual => f.write_str("manual"),
            Trigger::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// Terminal state of a request
#[derive(Debug)]
pub enum Outcome {
    /// The requested message reached the chat
    Sent,
    /// The fetch failed; for manual requests the user got an error reply
    Failed(FetchError),
}

impl Outcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent)
    }
}

/// Command router and report sender
pub struct FearGreedBot {
    source: Arc<dyn IndexSource>,
    messenger: Arc<dyn Messenger>,
    formatter: MessageFormatter,
}

impl FearGreedBot {
    pub fn new(
        source: Arc<dyn IndexSource>,
        messenger: Arc<dyn Messenger>,
        formatter: MessageFormatter,
    ) -> Self {
        Self {
            source,
            messenger,
            formatter,
        }
    }

    /// Route one inbound text message.
    ///
    /// Returns `Ok(None)` when the text is not a known command; nothing is
    /// sent in that case.
    pub async fn handle_text(&self, chat_id: ChatId, text: &str) -> Result<Option<Outcome>> {
        match Command::parse(text) {
            Ok(command) => self.dispatch(chat_id, command).await.map(Some),
            Err(e) => {
                debug!(%chat_id, error = %e, "Ignoring message");
                Ok(None)
            }
        }
    }

    /// Execute a parsed command
    pub async fn dispatch(&self, chat_id: ChatId, command: Command) -> Result<Outcome> {
        match command {
            Command::Start => {
                let text = self.formatter.welcome_text();
                self.messenger
                    .send_message(chat_id, &text, SendOptions::html())
                    .await?;
                Ok(Outcome::Sent)
            }
            Command::Help => {
                let text = self.formatter.help_text();
                self.messenger
                    .send_message(chat_id, &text, SendOptions::html().without_link_preview())
                    .await?;
                Ok(Outcome::Sent)
            }
            Command::Query(query) => self.answer_query(chat_id, query).await,
        }
    }

    /// Placeholder, report, then always remove the placeholder
    async fn answer_query(&self, chat_id: ChatId, query: Query) -> Result<Outcome> {
        let placeholder = self
            .messenger
            .send_message(chat_id, self.formatter.placeholder(query), SendOptions::plain())
            .await?;

        let outcome = self.report(chat_id, query, Trigger::Manual).await;

        if let Err(e) = self.messenger.delete_message(chat_id, placeholder).await {
            warn!(%chat_id, message_id = %placeholder, error = %e, "Failed to delete placeholder");
        }

        outcome
    }

    /// Push both markets to `recipient`, as the scheduler does
    pub async fn push_combined(&self, recipient: ChatId) -> Result<Outcome> {
        self.report(recipient, Query::Both, Trigger::Scheduled).await
    }

    /// Fetch, format and send one report
    pub async fn report(&self, chat_id: ChatId, query: Query, trigger: Trigger) -> Result<Outcome> {
        match self.render(query).await {
            Ok(body) => {
                let text = match trigger {
                    Trigger::Manual => self.formatter.mark_manual(&body),
                    Trigger::Scheduled => body,
                };
                self.messenger
                    .send_message(chat_id, &text, SendOptions::html().without_link_preview())
                    .await?;
                info!(%chat_id, ?query, %trigger, "Report sent");
                Ok(Outcome::Sent)
            }
            Err(err) => {
                error!(%chat_id, ?query, %trigger, error = %err, "Report failed");
                if trigger == Trigger::Manual {
                    let reply = self.formatter.format_fetch_error(query, &err);
                    self.messenger
                        .send_message(chat_id, &reply, SendOptions::html())
                        .await?;
                }
                Ok(Outcome::Failed(err))
            }
        }
    }

    /// Fetch the snapshots a query needs and render them
    async fn render(&self, query: Query) -> std::result::Result<String, FetchError> {
        match query.market() {
            Some(market) => {
                let snapshot = self.source.fetch(market).await?;
                Ok(self.formatter.format_snapshot(&snapshot))
            }
            None => {
                let (stock, crypto) = futures::try_join!(
                    self.source.fetch(Market::Stock),
                    self.source.fetch(Market::Crypto)
                )?;
                Ok(self.formatter.format_combined(&stock, &crypto))
            }
        }
    }
}
