//! Main menu labels, keyboards, and the fixed bot texts.

use crate::channels::markdown::escape;
use crate::channels::{Keyboard, Reply, UserRef};

/// Label of the cancel button shown during every flow.
pub const CANCEL_LABEL: &str = "Cancel";

/// Label of the "no limit" button on the partition-size step.
pub const ENTER_LABEL: &str = "Enter";

/// Callback data of the inline `Done` button on the navy step.
pub const DONE_DATA: &str = "done";

/// Callback data of the archive output buttons.
pub const ARCHIVE_TXT_DATA: &str = "archive:txt";
pub const ARCHIVE_ADM_NAVY_DATA: &str = "archive:adm_navy";
pub const ARCHIVE_VCF_DATA: &str = "archive:vcf";

/// Reply shown for free text at the menu.
pub const FALLBACK_TEXT: &str =
    "Please select an available menu option or send a file to convert.";

pub const CANCELED_TEXT: &str = "❌ Process canceled.";

/// An entry of the main reply keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Start,
    NumberToTxt,
    TxtToVcf,
    AdminNavy,
    NamedContacts,
    Developer,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 6] = [
        Self::Start,
        Self::NumberToTxt,
        Self::TxtToVcf,
        Self::AdminNavy,
        Self::NamedContacts,
        Self::Developer,
    ];

    /// The exact keyboard label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Start 🔄",
            Self::NumberToTxt => "1️⃣ MSG to TXT 📝",
            Self::TxtToVcf => "2️⃣ TXT to VCF 📱",
            Self::AdminNavy => "3️⃣ MSG to ADM & NAVY 📋",
            Self::NamedContacts => "4️⃣ MSG to VCF 📱",
            Self::Developer => "Developer 👨‍💻",
        }
    }

    /// Match a label exactly. Surrounding whitespace is ignored.
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|cmd| cmd.label() == text)
    }
}

/// The persistent main menu keyboard.
pub fn main_keyboard() -> Keyboard {
    use MenuCommand::*;
    Keyboard::reply([
        vec![Start.label()],
        vec![NumberToTxt.label(), TxtToVcf.label()],
        vec![AdminNavy.label(), NamedContacts.label()],
        vec![Developer.label()],
    ])
}

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::reply([[CANCEL_LABEL]])
}

pub fn partition_keyboard() -> Keyboard {
    Keyboard::reply([[ENTER_LABEL], [CANCEL_LABEL]])
}

pub fn done_keyboard() -> Keyboard {
    Keyboard::inline([[("✅ Done", DONE_DATA)]])
}

pub fn archive_keyboard() -> Keyboard {
    Keyboard::inline([
        [("📝 TXT", ARCHIVE_TXT_DATA)],
        [("📋 ADM & NAVY", ARCHIVE_ADM_NAVY_DATA)],
        [("📱 VCF", ARCHIVE_VCF_DATA)],
    ])
}

/// Greeting plus the main menu. The user's name is escaped for MarkdownV2.
pub fn welcome(user: &UserRef) -> Reply {
    let name = escape(&user.display_name());
    Reply::markdown(format!(
        "*🤖 Hello {name}\\!*\n\
         *Welcome to the vCard Bot\\!*\n\
         Please select from the available menu 🚀:\n\n\
         *1️⃣ Convert MSG to TXT*\n\
         *2️⃣ Convert TXT to VCF*\n\
         *3️⃣ Convert MSG to ADM & NAVY*\n\
         *4️⃣ Convert MSG to VCF*\n\n\
         You can also send an \\.msg or \\.eml email file to convert it\\."
    ))
    .with_keyboard(main_keyboard())
}

pub fn developer_info() -> Reply {
    Reply::markdown(format!(
        "*👨‍💻 Developer Information\\:*\n\n\
         *Name\\:* {}\n\
         *Version\\:* {}",
        escape(env!("CARGO_PKG_NAME")),
        escape(env!("CARGO_PKG_VERSION")),
    ))
}

pub fn help(is_admin: bool) -> Reply {
    let mut text = String::from(
        "Commands:\n\
         /start - show the main menu\n\
         /cancel - abort the current step\n\
         /help - this message\n\n\
         Send a .msg or .eml file at the menu to convert an email.",
    );
    if is_admin {
        text.push_str(
            "\n\nAdmin commands:\n\
             /allow <user id> - grant access\n\
             /deny <user id> - revoke access\n\
             /users - list allowed users",
        );
    }
    Reply::plain(text)
}
