//! Record formatters. Everything here is pure: inputs in, file bodies out.

pub mod contacts;
pub mod sanitize;
pub mod vcard;

pub use vcard::Record;

/// A rendered output file, ready to be written and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Body as text (lossy; artifacts are always produced from UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}
