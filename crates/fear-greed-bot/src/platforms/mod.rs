//! Chat platform transports

pub mod telegram;

pub use telegram::{TelegramClient, Update};
