//! Classifies a typed text before it reaches the state machine.
//!
//! Order matters: menu labels first, then cancel, then slash commands.
//! Only what is left is handed to the current state as input.

use super::menu::{self, MenuCommand};

/// An admin-only command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Allow(i64),
    Deny(i64),
    ListUsers,
    /// Malformed arguments; carries the usage line.
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Menu(MenuCommand),
    Cancel,
    Help,
    Admin(AdminCommand),
    /// Free text for the current step, trimmed.
    Input(String),
    /// A slash command nobody handles.
    Unknown(String),
}

impl Route {
    pub fn classify(text: &str) -> Self {
        if let Some(cmd) = MenuCommand::from_label(text) {
            return Self::Menu(cmd);
        }

        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case(menu::CANCEL_LABEL) {
            return Self::Cancel;
        }

        let Some(command_line) = trimmed.strip_prefix('/') else {
            return Self::Input(trimmed.to_string());
        };

        let mut parts = command_line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        // Group chats append the bot name: /start@my_bot
        let command = command.split('@').next().unwrap_or(command).to_ascii_lowercase();
        let argument = parts.next();

        match command.as_str() {
            "start" => Self::Menu(MenuCommand::Start),
            "cancel" => Self::Cancel,
            "help" => Self::Help,
            "users" => Self::Admin(AdminCommand::ListUsers),
            "allow" => Self::Admin(
                parse_user_id(argument)
                    .map(AdminCommand::Allow)
                    .unwrap_or(AdminCommand::Usage("Usage: /allow <user id>")),
            ),
            "deny" => Self::Admin(
                parse_user_id(argument)
                    .map(AdminCommand::Deny)
                    .unwrap_or(AdminCommand::Usage("Usage: /deny <user id>")),
            ),
            _ => Self::Unknown(format!("/{command}")),
        }
    }
}

fn parse_user_id(arg: Option<&str>) -> Option<i64> {
    arg?.parse().ok()
}
