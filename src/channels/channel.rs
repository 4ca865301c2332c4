//! Channel trait and the event/reply types that cross it.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;

/// Stream of inbound events produced by a running channel.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl UserRef {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// `@username` when there is one, otherwise the first name.
    pub fn display_name(&self) -> String {
        match (&self.username, &self.first_name) {
            (Some(u), _) => format!("@{u}"),
            (None, Some(f)) => f.clone(),
            (None, None) => self.id.to_string(),
        }
    }
}

/// What an inbound event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A text message.
    Text(String),
    /// An uploaded document, already downloaded.
    File { file_name: String, bytes: Vec<u8> },
    /// An inline keyboard button press.
    Button { callback_id: String, data: String },
}

/// One inbound event from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user: UserRef,
    /// Chat to reply into.
    pub chat_id: i64,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn text(user: UserRef, chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            user,
            chat_id,
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn file(
        user: UserRef,
        chat_id: i64,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            user,
            chat_id,
            kind: EventKind::File {
                file_name: file_name.into(),
                bytes: bytes.into(),
            },
        }
    }

    pub fn button(
        user: UserRef,
        chat_id: i64,
        callback_id: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            user,
            chat_id,
            kind: EventKind::Button {
                callback_id: callback_id.into(),
                data: data.into(),
            },
        }
    }

    /// Short action label for activity logging.
    pub fn action(&self) -> &'static str {
        match self.kind {
            EventKind::Text(_) => "Text command",
            EventKind::File { .. } => "File upload",
            EventKind::Button { .. } => "Button press",
        }
    }

    /// Action details for activity logging.
    pub fn details(&self) -> String {
        match &self.kind {
            EventKind::Text(text) => text.clone(),
            EventKind::File { file_name, bytes } => format!("{file_name} ({} bytes)", bytes.len()),
            EventKind::Button { data, .. } => data.clone(),
        }
    }
}

/// How the text of a reply should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    #[default]
    Plain,
    /// Telegram MarkdownV2; the text must already be escaped.
    MarkdownV2,
}

/// A keyboard attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Persistent reply keyboard of literal labels, row by row.
    Reply(Vec<Vec<String>>),
    /// Buttons under the message: rows of `(label, callback data)`.
    Inline(Vec<Vec<(String, String)>>),
    /// Hide the reply keyboard.
    Remove,
}

impl Keyboard {
    pub fn reply<R, L>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self::Reply(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn inline<R, L, D>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = (L, D)>,
        L: Into<String>,
        D: Into<String>,
    {
        Self::Inline(
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(label, data)| (label.into(), data.into()))
                        .collect()
                })
                .collect(),
        )
    }
}

/// An outbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: Markup,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::Plain,
            keyboard: None,
        }
    }

    /// Text that is already MarkdownV2-escaped.
    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::MarkdownV2,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// A chat transport the bot can run on.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name, for logs.
    fn name(&self) -> &str;

    /// Start receiving events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Send a text reply into a chat.
    async fn send_text(&self, chat_id: i64, reply: &Reply) -> Result<(), ChannelError>;

    /// Send a file from disk, presented to the user as `file_name`.
    async fn send_file(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), ChannelError>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn answer_button(&self, _callback_id: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Check that the channel can reach its backend.
    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
