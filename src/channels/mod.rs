//! Channel abstraction for message I/O.

pub mod channel;
pub mod markdown;
pub mod telegram;

pub use channel::*;
pub use telegram::TelegramChannel;
