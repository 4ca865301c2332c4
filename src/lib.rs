//! vcard-bot: a Telegram bot that turns phone numbers and email archives
//! into vCard and text files.

pub mod allowlist;
pub mod archive;
pub mod bot;
pub mod channels;
pub mod config;
pub mod conversation;
pub mod convert;
pub mod error;
pub mod logging;
pub mod scratch;

pub use bot::Bot;
pub use config::BotConfig;
pub use error::{Error, Result};
