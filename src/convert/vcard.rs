//! vCard 3.0 records and their textual rendering.

use std::fmt::Write as _;

/// Line terminator used in rendered cards.
const CRLF: &str = "\r\n";

/// One contact card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Display name (`FN`).
    pub full_name: String,
    /// Phone values, one `TEL;TYPE=CELL` line each, in order.
    pub phones: Vec<String>,
    /// Optional free-text `NOTE`.
    pub note: Option<String>,
}

impl Record {
    /// A card with a single phone number.
    pub fn new(full_name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            phones: vec![phone.into()],
            note: None,
        }
    }

    /// A card carrying several numbers under one name.
    pub fn group(full_name: impl Into<String>, phones: Vec<String>) -> Self {
        Self {
            full_name: full_name.into(),
            phones,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Render this record as one `BEGIN:VCARD` … `END:VCARD` block.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        out.push_str("BEGIN:VCARD");
        out.push_str(CRLF);
        out.push_str("VERSION:3.0");
        out.push_str(CRLF);
        let _ = write!(out, "FN:{}{CRLF}", escape_text(&self.full_name));
        for phone in &self.phones {
            let _ = write!(out, "TEL;TYPE=CELL:{phone}{CRLF}");
        }
        if let Some(note) = &self.note {
            let _ = write!(out, "NOTE:{}{CRLF}", escape_text(note));
        }
        out.push_str("END:VCARD");
        out.push_str(CRLF);
    }
}

/// Render a sequence of records into one file body.
pub fn render_all<'a>(records: impl IntoIterator<Item = &'a Record>) -> String {
    let mut out = String::new();
    for record in records {
        record.render_into(&mut out);
    }
    out
}

/// Escape a vCard 3.0 text value (RFC 2426 §5).
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Count the `BEGIN:VCARD` blocks in a rendered body.
pub fn count_cards(body: &str) -> usize {
    body.lines().filter(|l| *l == "BEGIN:VCARD").count()
}
