//! Chat-facing interfaces
//!
//! Platform-agnostic message types, the outbound [`Messenger`] seam and the
//! report formatter.

pub mod formatter;
pub mod interface;
pub mod message;

pub use formatter::{MessageFormatter, PushTime, delta_glyph};
#[cfg(test)]
pub use interface::MockMessenger;
pub use interface::Messenger;
pub use message::{ChatId, MessageId, ParseMode, SendOptions};
