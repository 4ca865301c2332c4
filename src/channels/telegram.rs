//! Telegram channel: long-polls the Bot API for updates.
//!
//! Native Bot API implementation over `reqwest`: `getUpdates` for text
//! messages, documents and inline-button presses; `sendMessage`,
//! `sendDocument` and `answerCallbackQuery` for replies.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::channels::markdown;
use crate::channels::{Channel, EventStream, InboundEvent, Keyboard, Markup, Reply, UserRef};
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Largest file the Bot API lets bots download.
const TELEGRAM_MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Back-off after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connects to the Bot API via long-polling.
#[derive(Clone)]
pub struct TelegramChannel {
    bot_token: SecretString,
    poll_timeout: Duration,
    client: reqwest::Client,
}

/// A decoded update, before any file download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedUpdate {
    /// Ready to hand to the bot.
    Event(InboundEvent),
    /// A document that still has to be fetched with `getFile`.
    Document {
        user: UserRef,
        chat_id: i64,
        file_name: String,
        file_id: String,
        file_size: Option<u64>,
    },
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, poll_timeout: Duration) -> Self {
        Self {
            bot_token,
            poll_timeout,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token.expose_secret()
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "https://api.telegram.org/file/bot{}/{file_path}",
            self.bot_token.expose_secret()
        )
    }

    fn send_failed(reason: impl Into<String>) -> ChannelError {
        ChannelError::SendFailed {
            name: "telegram".into(),
            reason: reason.into(),
        }
    }

    /// Send a reply, splitting long texts. The keyboard rides on the last chunk.
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), ChannelError> {
        let chunks = split_message(&reply.text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let keyboard = if i == last { reply.keyboard.as_ref() } else { None };
            self.send_message_chunk(chat_id, chunk, reply.markup, keyboard)
                .await?;
        }
        Ok(())
    }

    /// Send one chunk. MarkdownV2 chunks that Telegram rejects are retried as
    /// plain text.
    async fn send_message_chunk(
        &self,
        chat_id: i64,
        text: &str,
        markup: Markup,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let first = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&message_body(chat_id, text, markup, keyboard))
            .send()
            .await
            .map_err(|e| Self::send_failed(e.to_string()))?;

        if first.status().is_success() {
            return Ok(());
        }

        let first_status = first.status();
        let first_err = first.text().await.unwrap_or_default();
        if markup == Markup::Plain {
            return Err(Self::send_failed(format!(
                "sendMessage failed ({first_status}): {first_err}"
            )));
        }

        tracing::warn!(
            status = ?first_status,
            error = %first_err,
            "Telegram sendMessage with MarkdownV2 failed; retrying as plain text"
        );

        let plain = markdown::to_plain(text);
        let retry = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&message_body(chat_id, &plain, Markup::Plain, keyboard))
            .send()
            .await
            .map_err(|e| Self::send_failed(e.to_string()))?;

        if !retry.status().is_success() {
            let retry_err = retry.text().await.unwrap_or_default();
            return Err(Self::send_failed(format!(
                "sendMessage failed (markdown: {first_status}, plain: {retry_err})"
            )));
        }
        Ok(())
    }

    /// Send a document from memory.
    pub async fn send_document_bytes(
        &self,
        chat_id: i64,
        file_bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), ChannelError> {
        let part = Part::bytes(file_bytes).file_name(file_name.to_string());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let resp = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::send_failed(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(Self::send_failed(format!("sendDocument failed: {err}")));
        }

        tracing::info!(chat_id, file_name, "Telegram document sent");
        Ok(())
    }

    /// Resolve a `file_id` with `getFile` and download its content.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ChannelError> {
        let download_failed = |reason: String| ChannelError::DownloadFailed {
            name: "telegram".into(),
            file_id: file_id.to_string(),
            reason,
        };

        let resp = self
            .client
            .post(self.api_url("getFile"))
            .json(&json!({ "file_id": file_id }))
            .send()
            .await
            .map_err(|e| download_failed(e.to_string()))?;
        let data: Value = resp
            .json()
            .await
            .map_err(|e| download_failed(e.to_string()))?;

        let file_path = data
            .get("result")
            .and_then(|r| r.get("file_path"))
            .and_then(Value::as_str)
            .ok_or_else(|| download_failed(format!("getFile returned no file_path: {data}")))?;

        let resp = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(|e| download_failed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(download_failed(format!("download returned {}", resp.status())));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| download_failed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Turn a parsed update into an event, fetching documents on the way.
    async fn resolve(&self, parsed: ParsedUpdate) -> Result<InboundEvent, ChannelError> {
        match parsed {
            ParsedUpdate::Event(event) => Ok(event),
            ParsedUpdate::Document {
                user,
                chat_id,
                file_name,
                file_id,
                file_size,
            } => {
                if file_size.is_some_and(|s| s > TELEGRAM_MAX_DOWNLOAD_BYTES) {
                    return Err(ChannelError::DownloadFailed {
                        name: "telegram".into(),
                        file_id,
                        reason: "file is larger than 20 MB".into(),
                    });
                }
                let bytes = self.download_file(&file_id).await?;
                tracing::info!(user_id = user.id, file_name = %file_name, size = bytes.len(), "Document downloaded");
                Ok(InboundEvent::file(user, chat_id, file_name, bytes))
            }
        }
    }

    async fn poll_loop(self, tx: mpsc::UnboundedSender<InboundEvent>) {
        let mut offset: i64 = 0;
        tracing::info!("Telegram channel listening for messages...");

        loop {
            let body = json!({
                "offset": offset,
                "timeout": self.poll_timeout.as_secs(),
                "allowed_updates": ["message", "callback_query"]
            });

            let resp = match self.client.post(self.api_url("getUpdates")).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            let data: Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            let Some(results) = data.get("result").and_then(Value::as_array) else {
                tracing::warn!(response = %data, "Telegram getUpdates returned no result");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            };

            for update in results {
                // Advance offset past this update
                if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                    offset = uid + 1;
                }

                let Some(parsed) = parse_update(update) else {
                    continue;
                };

                let chat_id = match &parsed {
                    ParsedUpdate::Event(e) => e.chat_id,
                    ParsedUpdate::Document { chat_id, .. } => *chat_id,
                };

                let event = match self.resolve(parsed).await {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(chat_id, error = %e, "Dropping update");
                        let notice = Reply::plain(format!("❌ Could not download the file: {e}"));
                        if let Err(e) = self.send_message(chat_id, &notice).await {
                            tracing::warn!(chat_id, error = %e, "Failed to report download error");
                        }
                        continue;
                    }
                };

                if tx.send(event).is_err() {
                    tracing::info!("Telegram listener channel closed");
                    return;
                }
            }
        }
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.clone().poll_loop(tx));
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn send_text(&self, chat_id: i64, reply: &Reply) -> Result<(), ChannelError> {
        self.send_message(chat_id, reply).await
    }

    async fn send_file(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), ChannelError> {
        let file_bytes = tokio::fs::read(path).await?;
        self.send_document_bytes(chat_id, file_bytes, file_name).await
    }

    async fn answer_button(&self, callback_id: &str) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&json!({ "callback_query_id": callback_id }))
            .send()
            .await
            .map_err(|e| Self::send_failed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::send_failed(format!(
                "answerCallbackQuery returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_user(from: &Value) -> Option<UserRef> {
    let id = from.get("id").and_then(Value::as_i64)?;
    let mut user = UserRef::new(id);
    if let Some(username) = from.get("username").and_then(Value::as_str) {
        user = user.with_username(username);
    }
    if let Some(first_name) = from.get("first_name").and_then(Value::as_str) {
        user = user.with_first_name(first_name);
    }
    Some(user)
}

/// Decode one `getUpdates` entry. Updates the bot does not handle (photos,
/// stickers, edits) yield `None`.
pub fn parse_update(update: &Value) -> Option<ParsedUpdate> {
    if let Some(query) = update.get("callback_query") {
        let user = parse_user(query.get("from")?)?;
        let chat_id = query
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)
            .unwrap_or(user.id);
        let callback_id = query.get("id").and_then(Value::as_str)?;
        let data = query.get("data").and_then(Value::as_str).unwrap_or_default();
        return Some(ParsedUpdate::Event(InboundEvent::button(
            user,
            chat_id,
            callback_id,
            data,
        )));
    }

    let message = update.get("message")?;
    let user = parse_user(message.get("from")?)?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?;

    if let Some(text) = message.get("text").and_then(Value::as_str) {
        return Some(ParsedUpdate::Event(InboundEvent::text(user, chat_id, text)));
    }

    let document = message.get("document")?;
    let file_id = document.get("file_id").and_then(Value::as_str)?;
    let file_name = document
        .get("file_name")
        .and_then(Value::as_str)
        .unwrap_or("upload")
        .to_string();
    Some(ParsedUpdate::Document {
        user,
        chat_id,
        file_name,
        file_id: file_id.to_string(),
        file_size: document.get("file_size").and_then(Value::as_u64),
    })
}

/// JSON body for `sendMessage`.
pub fn message_body(
    chat_id: i64,
    text: &str,
    markup: Markup,
    keyboard: Option<&Keyboard>,
) -> Value {
    let mut body = json!({
        "chat_id": chat_id,
        "text": text,
    });
    if markup == Markup::MarkdownV2 {
        body["parse_mode"] = json!("MarkdownV2");
    }
    if let Some(keyboard) = keyboard {
        body["reply_markup"] = keyboard_markup(keyboard);
    }
    body
}

fn keyboard_markup(keyboard: &Keyboard) -> Value {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
                .collect();
            json!({ "keyboard": rows, "resize_keyboard": true })
        }
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|(label, data)| json!({ "text": label, "callback_data": data }))
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": rows })
        }
        Keyboard::Remove => json!({ "remove_keyboard": true }),
    }
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts on a char boundary.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut cut = max_len;
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }

        let chunk = &remaining[..cut];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(cut);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { cut } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
