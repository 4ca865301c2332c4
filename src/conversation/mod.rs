//! Conversation handling: menu, routing, per-user state, and the jobs a
//! finished flow runs.

pub mod job;
pub mod menu;
pub mod router;
pub mod session;
pub mod state;

pub use job::Job;
pub use menu::MenuCommand;
pub use router::{AdminCommand, Route};
pub use session::SessionStore;
pub use state::{ArchiveTarget, ConversationState, Step};
