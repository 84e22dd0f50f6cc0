//! Fear & greed index notification bot
//!
//! Fetches the CNN (US stock) and Alternative.me (crypto) fear & greed
//! indices and reports them to a Telegram chat, either on a daily schedule
//! or in answer to commands.
//!
//! - [`api`]: index providers behind the [`IndexSource`] trait
//! - [`bot`]: command routing and report delivery
//! - [`interface`]: message types, the [`Messenger`] trait and formatting
//! - [`platforms`]: the Telegram Bot API transport
//! - [`scheduler`]: cron-driven daily pushes
//!
//! # Example
//!
//! ```rust,ignore
//! use fear_greed_bot::{BotConfig, FearGreedBot, FearGreedClient, TelegramClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BotConfig::from_env()?;
//!     let bot = FearGreedBot::new(
//!         Arc::new(FearGreedClient::new(&config)?),
//!         Arc::new(TelegramClient::new(&config)?),
//!         config.formatter(),
//!     );
//!
//!     bot.push_combined(config.chat_id).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod interface;
pub mod platforms;
pub mod scheduler;
pub mod snapshot;

pub use api::{FearGreedClient, IndexSource};
pub use bot::{Command, FearGreedBot, Outcome, Query, Trigger};
pub use config::BotConfig;
pub use error::{BotError, DeliveryError, FetchError, Result};
pub use interface::{ChatId, MessageFormatter, MessageId, Messenger, SendOptions};
pub use platforms::TelegramClient;
pub use scheduler::{CronSchedule, PushJob, Scheduler};
pub use snapshot::{IndexSnapshot, Market, Rating};
