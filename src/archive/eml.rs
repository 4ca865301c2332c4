//! RFC 822 (`.eml`) extraction via `mail-parser`.

use chrono::{DateTime, Utc};
use mail_parser::{Addr, Address, MessageParser};

use super::EmailSummary;
use crate::error::ConvertError;

/// Parse a raw RFC 822 message.
pub fn parse(bytes: &[u8]) -> Result<EmailSummary, ConvertError> {
    let parsed = MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| ConvertError::archive("not a valid RFC 822 message"))?;

    if parsed.subject().is_none() && parsed.from().is_none() && parsed.date().is_none() {
        return Err(ConvertError::archive("message has no recognizable headers"));
    }

    Ok(EmailSummary {
        subject: parsed.subject().unwrap_or_default().to_string(),
        sender: parsed
            .from()
            .and_then(|addr| addr.first())
            .map(display_addr)
            .unwrap_or_default(),
        to: display_address_list(parsed.to()),
        date: parsed
            .date()
            .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0)),
        body: extract_body(&parsed),
    })
}

/// Format a header address the way mail clients show it.
pub fn display_addr(addr: &Addr) -> String {
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) if !name.is_empty() => format!("{name} <{address}>"),
        (_, Some(address)) => address.to_string(),
        (Some(name), None) => name.to_string(),
        (None, None) => String::new(),
    }
}

/// Join every address in a header into a `; `-separated list.
fn display_address_list(addr: Option<&Address>) -> String {
    let Some(addr) = addr else {
        return String::new();
    };
    let addrs: Vec<String> = match addr {
        Address::List(addrs) => addrs.iter().map(display_addr).collect(),
        Address::Group(groups) => groups
            .iter()
            .flat_map(|g| g.addresses.iter().map(display_addr))
            .collect(),
    };
    addrs
        .into_iter()
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

fn extract_body(parsed: &mail_parser::Message) -> String {
    if let Some(text) = parsed.body_text(0) {
        return text.into_owned();
    }
    if let Some(html) = parsed.body_html(0) {
        return strip_html(html.as_ref());
    }
    String::new()
}

/// Strip HTML tags, keeping text content and normalizing whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "From: Budi Santoso <budi@example.com>\r\n\
        To: Ops <ops@example.com>, desk@example.com\r\n\
        Subject: Weekly numbers\r\n\
        Date: Tue, 1 Oct 2024 09:30:00 +0000\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        \r\n\
        Hello team,\r\nPlease see below.\r\n";

    #[test]
    fn parse_extracts_headers_and_body() {
        let summary = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(summary.subject, "Weekly numbers");
        assert_eq!(summary.sender, "Budi Santoso <budi@example.com>");
        assert_eq!(summary.to, "Ops <ops@example.com>; desk@example.com");
        assert_eq!(summary.date_display(), "2024-10-01 09:30:00 +0000");
        assert!(summary.body.contains("Hello team,"));
        assert!(summary.body.contains("Please see below."));
    }

    #[test]
    fn parse_html_only_body() {
        let raw = "From: a@example.com\r\n\
            Subject: Html\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <html><body><p>Hi <b>there</b></p></body></html>\r\n";
        let summary = parse(raw.as_bytes()).unwrap();
        assert_eq!(summary.subject, "Html");
        assert!(summary.body.contains("Hi"));
        assert!(summary.body.contains("there"));
        assert!(!summary.body.contains("<b>"));
    }

    #[test]
    fn parse_rejects_headerless_input() {
        assert!(parse(b"just some words").is_err());
    }

    #[test]
    fn strip_html_basic() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_html("plain"), "plain");
        assert_eq!(strip_html(""), "");
    }
}
