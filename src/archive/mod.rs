//! Email archive extraction for Outlook `.msg` and RFC 822 `.eml` uploads.
//!
//! Both formats are reduced to an [`EmailSummary`], which the renderers in
//! [`render`] turn into text files or contact cards.

pub mod eml;
pub mod msg;
pub mod render;

use chrono::{DateTime, Utc};

use crate::error::ConvertError;

/// Magic bytes at the start of every OLE compound file.
pub const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// The fields extracted from an uploaded email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSummary {
    pub subject: String,
    /// Sender as `Name <address>` when both are known.
    pub sender: String,
    /// Recipients as one display string.
    pub to: String,
    pub date: Option<DateTime<Utc>>,
    pub body: String,
}

impl EmailSummary {
    /// Date as shown in output files; empty when the archive has none.
    pub fn date_display(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S %z").to_string())
            .unwrap_or_default()
    }
}

/// Which parser an upload goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Msg,
    Eml,
}

impl ArchiveKind {
    /// Detect the archive kind from content first, then from the file name.
    pub fn detect(file_name: &str, bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&OLE_MAGIC) {
            return Some(Self::Msg);
        }
        let lower = file_name.to_lowercase();
        if lower.ends_with(".eml") {
            Some(Self::Eml)
        } else if lower.ends_with(".msg") {
            Some(Self::Msg)
        } else {
            None
        }
    }
}

/// Extract an [`EmailSummary`] from an uploaded file.
pub fn parse(file_name: &str, bytes: &[u8]) -> Result<EmailSummary, ConvertError> {
    match ArchiveKind::detect(file_name, bytes) {
        Some(ArchiveKind::Msg) => msg::parse(bytes),
        Some(ArchiveKind::Eml) => eml::parse(bytes),
        None => Err(ConvertError::archive(format!(
            "{file_name} is not a .msg or .eml file"
        ))),
    }
}

/// File stem of an uploaded archive, used to name the outputs.
pub fn output_stem(file_name: &str) -> String {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("email");
    crate::convert::sanitize::file_stem(stem).unwrap_or_else(|_| "email".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_prefers_magic_bytes() {
        let mut bytes = OLE_MAGIC.to_vec();
        bytes.extend_from_slice(&[0; 16]);
        assert_eq!(ArchiveKind::detect("mail.eml", &bytes), Some(ArchiveKind::Msg));
        assert_eq!(ArchiveKind::detect("MAIL.EML", b"From: a"), Some(ArchiveKind::Eml));
        assert_eq!(ArchiveKind::detect("mail.Msg", b"junk"), Some(ArchiveKind::Msg));
        assert_eq!(ArchiveKind::detect("numbers.txt", b"0812"), None);
    }

    #[test]
    fn parse_rejects_unknown_upload() {
        let err = parse("numbers.txt", b"0812").unwrap_err();
        assert!(matches!(err, ConvertError::Archive { .. }));
    }

    #[test]
    fn output_stem_is_sanitized() {
        assert_eq!(output_stem("Weekly Report.msg"), "Weekly Report");
        assert_eq!(output_stem("a.b.eml"), "ab");
        assert_eq!(output_stem("📧.msg"), "email");
    }

    #[test]
    fn date_display_empty_without_date() {
        assert_eq!(EmailSummary::default().date_display(), "");
        let summary = EmailSummary {
            date: DateTime::from_timestamp(0, 0),
            ..Default::default()
        };
        assert_eq!(summary.date_display(), "1970-01-01 00:00:00 +0000");
    }
}
