//! Chat transport abstraction
//!
//! The router and the scheduler only ever talk to a [`Messenger`]; the
//! Telegram client in `platforms` is the production implementation.

use crate::error::DeliveryError;
use crate::interface::message::{ChatId, MessageId, SendOptions};
use async_trait::async_trait;

/// Outbound side of a chat platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message, returning the id the platform assigned to it
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: SendOptions,
    ) -> Result<MessageId, DeliveryError>;

    /// Delete a previously sent message
    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError>;
}
