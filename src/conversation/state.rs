//! Conversation state machine.
//!
//! A user is always in exactly one [`ConversationState`]. Each awaiting
//! step carries the values collected so far, so leaving a flow (finished,
//! failed, or canceled) drops them all at once.

use crate::archive::{self, EmailSummary};
use crate::channels::{Keyboard, Reply};
use crate::convert::sanitize;
use crate::error::{ConvertError, ValidationError};

use super::job::Job;
use super::menu::{self, MenuCommand};

/// What the two-number archive flow produces at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveTarget {
    /// `<stem>_ADM.txt` and `<stem>_NAVY.txt`.
    Tagged,
    /// `<stem>.vcf` with the email as card notes.
    Cards,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConversationState {
    /// At the main menu.
    #[default]
    Idle,

    // Number -> TXT
    AwaitingTxtNumber,
    AwaitingTxtFilename { number: String },

    // TXT -> VCF
    AwaitingVcfFilename,
    AwaitingPartitionSize { file_stem: String },
    AwaitingContactName {
        file_stem: String,
        partition_size: Option<usize>,
    },
    AwaitingNumbersFile {
        file_stem: String,
        partition_size: Option<usize>,
        contact_name: String,
    },

    // Admin & Navy
    AwaitingAdminNumbers,
    AwaitingNavyNumbers { admin: Vec<String> },

    // Named contacts
    AwaitingGroupName,
    AwaitingGroupNumbers { contact_name: String },

    // Archive conversion
    AwaitingArchiveTarget {
        email: EmailSummary,
        file_stem: String,
    },
    AwaitingArchiveAdmin {
        email: EmailSummary,
        file_stem: String,
        target: ArchiveTarget,
    },
    AwaitingArchiveNavy {
        email: EmailSummary,
        file_stem: String,
        target: ArchiveTarget,
        adm_number: String,
    },
}

/// Outcome of feeding one input to the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Move to a new awaiting state and show its prompt.
    Next(ConversationState),
    /// Produce output, then go back to the menu.
    Run(Job),
    /// This state does not take this kind of input; nothing changes.
    Unexpected,
}

impl ConversationState {
    /// First step of a menu flow. `Start` and `Developer` have none.
    pub fn entry(command: MenuCommand) -> Option<Self> {
        match command {
            MenuCommand::NumberToTxt => Some(Self::AwaitingTxtNumber),
            MenuCommand::TxtToVcf => Some(Self::AwaitingVcfFilename),
            MenuCommand::AdminNavy => Some(Self::AwaitingAdminNumbers),
            MenuCommand::NamedContacts => Some(Self::AwaitingGroupName),
            MenuCommand::Start | MenuCommand::Developer => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingTxtNumber => "awaiting_txt_number",
            Self::AwaitingTxtFilename { .. } => "awaiting_txt_filename",
            Self::AwaitingVcfFilename => "awaiting_vcf_filename",
            Self::AwaitingPartitionSize { .. } => "awaiting_partition_size",
            Self::AwaitingContactName { .. } => "awaiting_contact_name",
            Self::AwaitingNumbersFile { .. } => "awaiting_numbers_file",
            Self::AwaitingAdminNumbers => "awaiting_admin_numbers",
            Self::AwaitingNavyNumbers { .. } => "awaiting_navy_numbers",
            Self::AwaitingGroupName => "awaiting_group_name",
            Self::AwaitingGroupNumbers { .. } => "awaiting_group_numbers",
            Self::AwaitingArchiveTarget { .. } => "awaiting_archive_target",
            Self::AwaitingArchiveAdmin { .. } => "awaiting_archive_admin",
            Self::AwaitingArchiveNavy { .. } => "awaiting_archive_navy",
        }
    }

    /// The question this state is waiting on. `None` at the menu.
    pub fn prompt(&self) -> Option<Reply> {
        let with_cancel = |text: &str| Reply::plain(text).with_keyboard(menu::cancel_keyboard());
        let reply = match self {
            Self::Idle => return None,
            Self::AwaitingTxtNumber => with_cancel("Please enter the number to be saved."),
            Self::AwaitingTxtFilename { .. } => {
                with_cancel("Please enter the filename (without extension):")
            }
            Self::AwaitingVcfFilename => with_cancel("Please enter a name for the VCF file."),
            Self::AwaitingPartitionSize { .. } => Reply::plain(
                "Please enter partition size (enter a number to limit, or press 'Enter' to not limit):",
            )
            .with_keyboard(menu::partition_keyboard()),
            Self::AwaitingContactName { .. } => with_cancel("Please enter the contact name:"),
            Self::AwaitingNumbersFile { .. } => Reply::plain(
                "Please send the TXT file to be converted (one number per line), or type cancel.",
            )
            .with_keyboard(Keyboard::Remove),
            Self::AwaitingAdminNumbers => with_cancel("Enter Admin numbers (one per line):"),
            Self::AwaitingNavyNumbers { .. } => {
                Reply::plain("Enter Navy numbers (one per line), or press Done to finish:")
                    .with_keyboard(menu::done_keyboard())
            }
            Self::AwaitingGroupName => with_cancel("Please enter the contact name for the VCF."),
            Self::AwaitingGroupNumbers { contact_name } => with_cancel(&format!(
                "Contact name '{contact_name}' has been saved.\n\
                 Please send contact numbers (can be more than one, separate with newlines)."
            )),
            Self::AwaitingArchiveTarget { email, .. } => {
                let subject = if email.subject.is_empty() {
                    "(no subject)"
                } else {
                    email.subject.as_str()
                };
                Reply::plain(format!(
                    "📧 Email read: {subject}\nChoose the output format:"
                ))
                .with_keyboard(menu::archive_keyboard())
            }
            Self::AwaitingArchiveAdmin { .. } => with_cancel("Enter the ADM number:"),
            Self::AwaitingArchiveNavy { .. } => with_cancel("Enter the NAVY number:"),
        };
        Some(reply)
    }

    /// Feed a typed text. Menu labels and cancel are routed before this.
    pub fn accept_text(&self, input: &str) -> Result<Step, ConvertError> {
        let step = match self {
            Self::AwaitingTxtNumber => Step::Next(Self::AwaitingTxtFilename {
                number: sanitize::phone_number(input)?,
            }),
            Self::AwaitingTxtFilename { number } => Step::Run(Job::NumberTxt {
                file_stem: sanitize::file_stem(input)?,
                number: number.clone(),
            }),
            Self::AwaitingVcfFilename => Step::Next(Self::AwaitingPartitionSize {
                file_stem: sanitize::file_stem(input)?,
            }),
            Self::AwaitingPartitionSize { file_stem } => Step::Next(Self::AwaitingContactName {
                file_stem: file_stem.clone(),
                partition_size: sanitize::partition_size(input),
            }),
            Self::AwaitingContactName {
                file_stem,
                partition_size,
            } => Step::Next(Self::AwaitingNumbersFile {
                file_stem: file_stem.clone(),
                partition_size: *partition_size,
                contact_name: sanitize::contact_name(input)?,
            }),
            Self::AwaitingAdminNumbers => Step::Next(Self::AwaitingNavyNumbers {
                admin: sanitize::phone_numbers(input)?,
            }),
            Self::AwaitingNavyNumbers { admin } => Step::Run(Job::AdminNavyNumbered {
                admin: admin.clone(),
                navy: sanitize::phone_numbers(input)?,
            }),
            Self::AwaitingGroupName => Step::Next(Self::AwaitingGroupNumbers {
                contact_name: sanitize::contact_name(input)?,
            }),
            Self::AwaitingGroupNumbers { contact_name } => Step::Run(Job::NamedContacts {
                contact_name: contact_name.clone(),
                numbers: sanitize::phone_numbers(input)?,
            }),
            Self::AwaitingArchiveAdmin {
                email,
                file_stem,
                target,
            } => Step::Next(Self::AwaitingArchiveNavy {
                email: email.clone(),
                file_stem: file_stem.clone(),
                target: *target,
                adm_number: sanitize::phone_number(input)?,
            }),
            Self::AwaitingArchiveNavy {
                email,
                file_stem,
                target,
                adm_number,
            } => {
                let navy_number = sanitize::phone_number(input)?;
                let email = email.clone();
                let file_stem = file_stem.clone();
                let adm_number = adm_number.clone();
                Step::Run(match target {
                    ArchiveTarget::Tagged => Job::ArchiveTagged {
                        email,
                        file_stem,
                        adm_number,
                        navy_number,
                    },
                    ArchiveTarget::Cards => Job::ArchiveCards {
                        email,
                        file_stem,
                        adm_number,
                        navy_number,
                    },
                })
            }
            Self::Idle | Self::AwaitingNumbersFile { .. } | Self::AwaitingArchiveTarget { .. } => {
                Step::Unexpected
            }
        };
        Ok(step)
    }

    /// Feed an uploaded file. At the menu it must be an email archive; on
    /// the numbers step it must be UTF-8 text with one number per line.
    pub fn accept_file(&self, file_name: &str, bytes: &[u8]) -> Result<Step, ConvertError> {
        match self {
            Self::Idle => {
                let email = archive::parse(file_name, bytes)?;
                Ok(Step::Next(Self::AwaitingArchiveTarget {
                    email,
                    file_stem: archive::output_stem(file_name),
                }))
            }
            Self::AwaitingNumbersFile {
                file_stem,
                partition_size,
                contact_name,
            } => {
                let text = std::str::from_utf8(bytes).map_err(|_| ValidationError::NotText)?;
                let text = text.strip_prefix('\u{feff}').unwrap_or(text);
                Ok(Step::Run(Job::NumbersToVcf {
                    file_stem: file_stem.clone(),
                    contact_name: contact_name.clone(),
                    partition_size: *partition_size,
                    numbers: sanitize::phone_numbers(text)?,
                }))
            }
            _ => Ok(Step::Unexpected),
        }
    }

    /// Feed an inline button press.
    pub fn accept_button(&self, data: &str) -> Step {
        match (self, data) {
            (Self::AwaitingNavyNumbers { admin }, menu::DONE_DATA) => {
                Step::Run(Job::AdminNavyGrouped {
                    admin: admin.clone(),
                    navy: Vec::new(),
                })
            }
            (Self::AwaitingArchiveTarget { email, file_stem }, data) => {
                let target = match data {
                    menu::ARCHIVE_TXT_DATA => {
                        return Step::Run(Job::ArchiveText {
                            email: email.clone(),
                            file_stem: file_stem.clone(),
                        });
                    }
                    menu::ARCHIVE_ADM_NAVY_DATA => ArchiveTarget::Tagged,
                    menu::ARCHIVE_VCF_DATA => ArchiveTarget::Cards,
                    _ => return Step::Unexpected,
                };
                Step::Next(Self::AwaitingArchiveAdmin {
                    email: email.clone(),
                    file_stem: file_stem.clone(),
                    target,
                })
            }
            _ => Step::Unexpected,
        }
    }

    /// Whether this state waits for an upload rather than typed text.
    pub fn wants_file(&self) -> bool {
        matches!(self, Self::AwaitingNumbersFile { .. })
    }
}
