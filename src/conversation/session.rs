//! In-memory per-user sessions.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::state::ConversationState;

/// Conversation state per user id. Unknown users are at the menu; nothing
/// is persisted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, ConversationState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's current state, `Idle` for unknown users.
    pub async fn state(&self, user_id: i64) -> ConversationState {
        self.sessions
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the user's state. Going back to `Idle` forgets the session.
    pub async fn set(&self, user_id: i64, state: ConversationState) {
        let mut sessions = self.sessions.lock().await;
        let from = sessions.get(&user_id).map_or("idle", ConversationState::name);
        tracing::debug!(user_id, from, to = state.name(), "State change");
        if state.is_idle() {
            sessions.remove(&user_id);
        } else {
            sessions.insert(user_id, state);
        }
    }

    /// Back to the menu, dropping everything collected.
    pub async fn reset(&self, user_id: i64) {
        self.set(user_id, ConversationState::Idle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_users_are_idle() {
        let store = SessionStore::new();
        assert!(store.state(1).await.is_idle());
    }

    #[tokio::test]
    async fn set_and_reset() {
        let store = SessionStore::new();
        store
            .set(
                7,
                ConversationState::AwaitingNavyNumbers {
                    admin: vec!["1".into()],
                },
            )
            .await;
        store.set(8, ConversationState::AwaitingAdminNumbers).await;
        assert_eq!(
            store.state(7).await,
            ConversationState::AwaitingNavyNumbers {
                admin: vec!["1".into()]
            }
        );

        store.reset(7).await;
        assert!(store.state(7).await.is_idle());
        assert_eq!(store.state(8).await, ConversationState::AwaitingAdminNumbers);
    }
}
