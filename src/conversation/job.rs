//! Terminal actions: everything a completed flow needs to produce its files.

use crate::archive::{EmailSummary, render};
use crate::convert::vcard::render_all;
use crate::convert::{Artifact, contacts, sanitize};

/// File name of the numbered admin/navy output.
pub const ADMIN_NAVY_FILE: &str = "AdminNavy.vcf";

/// File name of the grouped admin/navy output.
pub const GROUPED_FILE: &str = "contacts.vcf";

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// A single number saved as `<stem>.txt`.
    NumberTxt { file_stem: String, number: String },
    /// An uploaded number list split into `<stem>_<k>.vcf` files.
    NumbersToVcf {
        file_stem: String,
        contact_name: String,
        partition_size: Option<usize>,
        numbers: Vec<String>,
    },
    AdminNavyNumbered { admin: Vec<String>, navy: Vec<String> },
    AdminNavyGrouped { admin: Vec<String>, navy: Vec<String> },
    /// One card per number, all with the same name.
    NamedContacts {
        contact_name: String,
        numbers: Vec<String>,
    },
    ArchiveText { email: EmailSummary, file_stem: String },
    ArchiveTagged {
        email: EmailSummary,
        file_stem: String,
        adm_number: String,
        navy_number: String,
    },
    ArchiveCards {
        email: EmailSummary,
        file_stem: String,
        adm_number: String,
        navy_number: String,
    },
}

impl Job {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NumberTxt { .. } => "number_txt",
            Self::NumbersToVcf { .. } => "numbers_to_vcf",
            Self::AdminNavyNumbered { .. } => "admin_navy_numbered",
            Self::AdminNavyGrouped { .. } => "admin_navy_grouped",
            Self::NamedContacts { .. } => "named_contacts",
            Self::ArchiveText { .. } => "archive_text",
            Self::ArchiveTagged { .. } => "archive_tagged",
            Self::ArchiveCards { .. } => "archive_cards",
        }
    }

    /// Render every output file, in send order.
    pub fn artifacts(&self) -> Vec<Artifact> {
        match self {
            Self::NumberTxt { file_stem, number } => {
                vec![contacts::number_txt(file_stem, number)]
            }
            Self::NumbersToVcf {
                file_stem,
                contact_name,
                partition_size,
                numbers,
            } => contacts::partitioned_vcf(file_stem, contact_name, numbers, *partition_size),
            Self::AdminNavyNumbered { admin, navy } => vec![Artifact::new(
                ADMIN_NAVY_FILE,
                render_all(&contacts::admin_navy_numbered(admin, navy)),
            )],
            Self::AdminNavyGrouped { admin, navy } => vec![Artifact::new(
                GROUPED_FILE,
                render_all(&contacts::admin_navy_grouped(admin, navy)),
            )],
            Self::NamedContacts {
                contact_name,
                numbers,
            } => {
                let stem = sanitize::file_stem(contact_name)
                    .unwrap_or_else(|_| "contacts".to_string());
                vec![Artifact::new(
                    format!("{stem}.vcf"),
                    render_all(&contacts::same_name(contact_name, numbers)),
                )]
            }
            Self::ArchiveText { email, file_stem } => {
                vec![render::text_artifact(file_stem, email)]
            }
            Self::ArchiveTagged {
                email,
                file_stem,
                adm_number,
                navy_number,
            } => render::tagged_artifacts(file_stem, email, adm_number, navy_number),
            Self::ArchiveCards {
                email,
                file_stem,
                adm_number,
                navy_number,
            } => vec![render::note_card_artifact(
                file_stem,
                email,
                adm_number,
                navy_number,
            )],
        }
    }

    /// Confirmation sent after every file went out.
    pub fn success_message(&self) -> &'static str {
        match self {
            Self::NumberTxt { .. } | Self::ArchiveText { .. } => "TXT file created successfully! ✅",
            Self::NumbersToVcf { .. } => "All VCF files created successfully ✅!",
            Self::AdminNavyNumbered { .. } | Self::AdminNavyGrouped { .. } => {
                "Admin & Navy file created successfully! ✅"
            }
            Self::NamedContacts { .. } | Self::ArchiveCards { .. } => {
                "VCF file created successfully! ✅"
            }
            Self::ArchiveTagged { .. } => "ADM & NAVY files created successfully! ✅",
        }
    }
}
