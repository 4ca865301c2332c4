//! Dispatcher: takes events off the channel one at a time and drives the
//! conversation state machine.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::RwLock;

use crate::allowlist::AllowList;
use crate::channels::{Channel, EventKind, InboundEvent, Reply};
use crate::conversation::menu;
use crate::conversation::{
    AdminCommand, ConversationState, Job, MenuCommand, Route, SessionStore, Step,
};
use crate::error::{ChannelError, ConvertError, Error};
use crate::scratch::ScratchDir;

/// The running bot.
pub struct Bot {
    channel: Arc<dyn Channel>,
    sessions: SessionStore,
    admins: BTreeSet<i64>,
    allowlist: RwLock<AllowList>,
    scratch: ScratchDir,
}

impl Bot {
    pub fn new(
        channel: Arc<dyn Channel>,
        admin_ids: impl IntoIterator<Item = i64>,
        allowlist: AllowList,
        scratch: ScratchDir,
    ) -> Self {
        Self {
            channel,
            sessions: SessionStore::new(),
            admins: admin_ids.into_iter().collect(),
            allowlist: RwLock::new(allowlist),
            scratch,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Consume the channel's events until it ends or Ctrl+C.
    pub async fn run(&self) -> Result<(), Error> {
        if let Err(e) = self.channel.health_check().await {
            tracing::warn!(channel = self.channel.name(), error = %e, "Health check failed");
        }

        let mut events = self.channel.start().await?;
        tracing::info!(channel = self.channel.name(), "Bot ready and listening");

        loop {
            let event = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                event = events.next() => match event {
                    Some(event) => event,
                    None => {
                        tracing::info!("Channel stream ended, shutting down...");
                        break;
                    }
                }
            };

            self.handle_event(event).await;
        }

        self.channel.shutdown().await?;
        Ok(())
    }

    /// Handle one event to completion. Transport failures are logged, not
    /// returned, so one broken chat cannot stop the loop.
    pub async fn handle_event(&self, event: InboundEvent) {
        tracing::info!(
            user_id = event.user.id,
            username = event.user.username.as_deref().unwrap_or("-"),
            action = event.action(),
            details = %event.details(),
            "Activity"
        );

        if let Err(e) = self.dispatch(&event).await {
            tracing::error!(user_id = event.user.id, error = %e, "Error handling event");
        }
    }

    // ── Access control ──────────────────────────────────────────────

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }

    /// Admins and allow-listed users. With no admins and an empty list,
    /// everyone.
    pub async fn is_authorized(&self, user_id: i64) -> bool {
        if self.is_admin(user_id) {
            return true;
        }
        let allowlist = self.allowlist.read().await;
        allowlist.contains(user_id) || (self.admins.is_empty() && allowlist.is_empty())
    }

    // ── Dispatch ────────────────────────────────────────────────────

    async fn dispatch(&self, event: &InboundEvent) -> Result<(), ChannelError> {
        if let EventKind::Button { callback_id, .. } = &event.kind {
            if let Err(e) = self.channel.answer_button(callback_id).await {
                tracing::warn!(error = %e, "Failed to acknowledge button press");
            }
        }

        if !self.is_authorized(event.user.id).await {
            tracing::warn!(user_id = event.user.id, "Unauthorized user");
            return self
                .send(
                    event.chat_id,
                    Reply::plain(format!(
                        "⛔ You are not authorized to use this bot.\nYour user id is {}. \
                         Ask an admin to run /allow {}.",
                        event.user.id, event.user.id
                    )),
                )
                .await;
        }

        match &event.kind {
            EventKind::Text(text) => self.handle_text(event, text).await,
            EventKind::File { file_name, bytes } => {
                let state = self.sessions.state(event.user.id).await;
                let step = state.accept_file(file_name, bytes);
                self.advance(event, state, step).await
            }
            EventKind::Button { data, .. } => {
                let state = self.sessions.state(event.user.id).await;
                match state.accept_button(data) {
                    Step::Unexpected => {
                        tracing::debug!(data = %data, state = state.name(), "Stale button press");
                        Ok(())
                    }
                    step => self.advance(event, state, Ok(step)).await,
                }
            }
        }
    }

    async fn handle_text(&self, event: &InboundEvent, text: &str) -> Result<(), ChannelError> {
        let user_id = event.user.id;
        match Route::classify(text) {
            Route::Menu(MenuCommand::Start) => self.back_to_menu(event).await,
            Route::Menu(MenuCommand::Developer) => {
                self.send(event.chat_id, menu::developer_info()).await
            }
            Route::Menu(command) => {
                let Some(state) = ConversationState::entry(command) else {
                    return self.back_to_menu(event).await;
                };
                let prompt = state.prompt();
                self.sessions.set(user_id, state).await;
                match prompt {
                    Some(prompt) => self.send(event.chat_id, prompt).await,
                    None => Ok(()),
                }
            }
            Route::Cancel => {
                self.send(event.chat_id, Reply::plain(menu::CANCELED_TEXT))
                    .await?;
                self.back_to_menu(event).await
            }
            Route::Help => {
                self.send(event.chat_id, menu::help(self.is_admin(user_id)))
                    .await
            }
            Route::Admin(command) => self.handle_admin(event, command).await,
            Route::Unknown(command) => {
                self.send(
                    event.chat_id,
                    Reply::plain(format!("Unknown command {command}. Send /help for a list.")),
                )
                .await
            }
            Route::Input(input) => {
                let state = self.sessions.state(user_id).await;
                let step = state.accept_text(&input);
                self.advance(event, state, step).await
            }
        }
    }

    /// Apply the outcome of feeding input to `state`.
    async fn advance(
        &self,
        event: &InboundEvent,
        state: ConversationState,
        step: Result<Step, ConvertError>,
    ) -> Result<(), ChannelError> {
        let user_id = event.user.id;
        let chat_id = event.chat_id;

        match step {
            Ok(Step::Next(next)) => {
                let prompt = next.prompt();
                self.sessions.set(user_id, next).await;
                if let Some(prompt) = prompt {
                    self.send(chat_id, prompt).await?;
                }
                Ok(())
            }
            Ok(Step::Run(job)) => {
                self.sessions.reset(user_id).await;
                match self.run_job(user_id, chat_id, &job).await {
                    Ok(()) => {
                        tracing::info!(user_id, job = job.name(), "Job completed");
                        self.send(chat_id, Reply::plain(job.success_message()))
                            .await?;
                    }
                    Err(e) => {
                        tracing::error!(user_id, job = job.name(), error = %e, "Job failed");
                        self.send(chat_id, error_reply(&e)).await?;
                    }
                }
                self.back_to_menu(event).await
            }
            Ok(Step::Unexpected) if state.is_idle() => {
                self.send(chat_id, Reply::plain(menu::FALLBACK_TEXT)).await
            }
            Ok(Step::Unexpected) => {
                let hint = if state.wants_file() {
                    "⚠️ Please upload a file for this step, or press Cancel."
                } else {
                    "⚠️ That is not what this step expects. Please try again or press Cancel."
                };
                self.send(chat_id, Reply::plain(hint)).await?;
                self.reprompt(chat_id, &state).await
            }
            Err(e) if e.is_validation() => {
                tracing::info!(user_id, state = state.name(), error = %e, "Rejected input");
                self.send(chat_id, Reply::plain(format!("⚠️ {e}"))).await?;
                self.reprompt(chat_id, &state).await
            }
            Err(e) => {
                tracing::error!(user_id, state = state.name(), error = %e, "Conversion failed");
                self.sessions.reset(user_id).await;
                self.send(chat_id, error_reply(&Error::from(e))).await?;
                self.back_to_menu(event).await
            }
        }
    }

    /// Render the job's files into a fresh scratch area and send them. The
    /// area is removed when this returns, on every path.
    async fn run_job(&self, user_id: i64, chat_id: i64, job: &Job) -> Result<(), Error> {
        let area = self
            .scratch
            .acquire(user_id)
            .await
            .map_err(ConvertError::from)?;

        for artifact in job.artifacts() {
            let path = area
                .write(&artifact.file_name, &artifact.content)
                .await
                .map_err(ConvertError::from)?;
            self.channel
                .send_file(chat_id, &path, &artifact.file_name)
                .await?;
            tracing::debug!(user_id, file_name = %artifact.file_name, "Artifact sent");
        }
        Ok(())
    }

    async fn handle_admin(
        &self,
        event: &InboundEvent,
        command: AdminCommand,
    ) -> Result<(), ChannelError> {
        if !self.is_admin(event.user.id) {
            return self
                .send(event.chat_id, Reply::plain("⛔ Only admins can manage users."))
                .await;
        }

        let text = match command {
            AdminCommand::Usage(usage) => usage.to_string(),
            AdminCommand::ListUsers => {
                let users = self.allowlist.read().await.users();
                if users.is_empty() {
                    "The allow-list is empty.".to_string()
                } else {
                    let lines: Vec<String> = users.iter().map(|id| format!("- {id}")).collect();
                    format!("Allowed users:\n{}", lines.join("\n"))
                }
            }
            AdminCommand::Allow(user_id) => {
                match self.allowlist.write().await.insert(user_id).await {
                    Ok(true) => {
                        tracing::info!(admin = event.user.id, user_id, "User allowed");
                        format!("✅ User {user_id} can now use the bot.")
                    }
                    Ok(false) => format!("User {user_id} is already allowed."),
                    Err(e) => format!("❌ An error occurred: {e}"),
                }
            }
            AdminCommand::Deny(user_id) => {
                match self.allowlist.write().await.remove(user_id).await {
                    Ok(true) => {
                        tracing::info!(admin = event.user.id, user_id, "User denied");
                        format!("✅ User {user_id} was removed.")
                    }
                    Ok(false) => format!("User {user_id} was not on the allow-list."),
                    Err(e) => format!("❌ An error occurred: {e}"),
                }
            }
        };
        self.send(event.chat_id, Reply::plain(text)).await
    }

    // ── Helpers ─────────────────────────────────────────────────────

    async fn back_to_menu(&self, event: &InboundEvent) -> Result<(), ChannelError> {
        self.sessions.reset(event.user.id).await;
        self.send(event.chat_id, menu::welcome(&event.user)).await
    }

    async fn reprompt(&self, chat_id: i64, state: &ConversationState) -> Result<(), ChannelError> {
        match state.prompt() {
            Some(prompt) => self.send(chat_id, prompt).await,
            None => Ok(()),
        }
    }

    async fn send(&self, chat_id: i64, reply: Reply) -> Result<(), ChannelError> {
        self.channel.send_text(chat_id, &reply).await
    }
}

/// User-facing text for a failed job: the innermost error message.
fn error_reply(error: &Error) -> Reply {
    let detail = match error {
        Error::Convert(e) => e.to_string(),
        Error::Channel(e) => e.to_string(),
        Error::Store(e) => e.to_string(),
        Error::Config(e) => e.to_string(),
    };
    Reply::plain(format!("❌ An error occurred: {detail}"))
}
