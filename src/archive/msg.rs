//! Outlook `.msg` extraction.
//!
//! A `.msg` file is an OLE compound file. Each MAPI property of the message
//! lives either in its own `__substg1.0_<id><type>` stream (strings, binary)
//! or in the fixed-size entries of `__properties_version1.0` (times, ints).

use std::io::{Cursor, Read, Seek};

use cfb::CompoundFile;
use chrono::{DateTime, Utc};
use mail_parser::MessageParser;

use super::EmailSummary;
use super::eml::strip_html;
use crate::error::ConvertError;

const PROPERTIES_STREAM: &str = "/__properties_version1.0";
/// Header length of the property stream of a top-level message.
const TOP_LEVEL_HEADER_LEN: usize = 32;
const PROPERTY_ENTRY_LEN: usize = 16;

const PT_STRING8: u16 = 0x001E;
const PT_UNICODE: u16 = 0x001F;
const PT_SYSTIME: u16 = 0x0040;
const PT_BINARY: u16 = 0x0102;

const PR_SUBJECT: u16 = 0x0037;
const PR_CLIENT_SUBMIT_TIME: u16 = 0x0039;
const PR_TRANSPORT_MESSAGE_HEADERS: u16 = 0x007D;
const PR_SENDER_NAME: u16 = 0x0C1A;
const PR_SENDER_EMAIL_ADDRESS: u16 = 0x0C1F;
const PR_DISPLAY_TO: u16 = 0x0E04;
const PR_MESSAGE_DELIVERY_TIME: u16 = 0x0E06;
const PR_BODY: u16 = 0x1000;
const PR_BODY_HTML: u16 = 0x1013;
const PR_SENDER_SMTP_ADDRESS: u16 = 0x5D01;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// Parse a `.msg` payload.
pub fn parse(bytes: &[u8]) -> Result<EmailSummary, ConvertError> {
    let mut comp = CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| ConvertError::archive(format!("not an Outlook message: {e}")))?;

    let subject = read_string(&mut comp, PR_SUBJECT);
    let sender_name = read_string(&mut comp, PR_SENDER_NAME);
    let sender_address = read_string(&mut comp, PR_SENDER_SMTP_ADDRESS).or_else(|| {
        read_string(&mut comp, PR_SENDER_EMAIL_ADDRESS).filter(|a| a.contains('@'))
    });
    let to = read_string(&mut comp, PR_DISPLAY_TO);
    let body = read_string(&mut comp, PR_BODY).or_else(|| {
        read_stream(&mut comp, &stream_path(PR_BODY_HTML, PT_BINARY))
            .map(|html| strip_html(&String::from_utf8_lossy(&html)))
    });

    if subject.is_none() && sender_name.is_none() && body.is_none() {
        return Err(ConvertError::archive(
            "the file contains no message properties",
        ));
    }

    let date = read_stream(&mut comp, PROPERTIES_STREAM)
        .and_then(|props| {
            find_systime(&props, PR_CLIENT_SUBMIT_TIME)
                .or_else(|| find_systime(&props, PR_MESSAGE_DELIVERY_TIME))
        })
        .or_else(|| {
            read_string(&mut comp, PR_TRANSPORT_MESSAGE_HEADERS)
                .and_then(|headers| date_from_headers(&headers))
        });

    Ok(EmailSummary {
        subject: subject.unwrap_or_default(),
        sender: display_sender(sender_name, sender_address),
        to: to.unwrap_or_default(),
        date,
        body: body.unwrap_or_default(),
    })
}

fn stream_path(prop_id: u16, prop_type: u16) -> String {
    format!("/__substg1.0_{prop_id:04X}{prop_type:04X}")
}

fn read_stream<F: Read + Seek>(comp: &mut CompoundFile<F>, path: &str) -> Option<Vec<u8>> {
    let mut stream = comp.open_stream(path).ok()?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).ok()?;
    Some(buf)
}

/// Read a string property, preferring the Unicode stream over the 8-bit one.
fn read_string<F: Read + Seek>(comp: &mut CompoundFile<F>, prop_id: u16) -> Option<String> {
    let value = match read_stream(comp, &stream_path(prop_id, PT_UNICODE)) {
        Some(bytes) => decode_utf16le(&bytes),
        None => decode_8bit(&read_stream(comp, &stream_path(prop_id, PT_STRING8))?),
    };
    let value = value.trim_end_matches('\0').to_string();
    (!value.is_empty()).then_some(value)
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// 8-bit strings are UTF-8 in practice; anything else is read as Latin-1.
fn decode_8bit(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Look up a `PT_SYSTIME` property in a top-level property stream.
fn find_systime(props: &[u8], prop_id: u16) -> Option<DateTime<Utc>> {
    let wanted = (u32::from(prop_id) << 16) | u32::from(PT_SYSTIME);
    props
        .get(TOP_LEVEL_HEADER_LEN..)?
        .chunks_exact(PROPERTY_ENTRY_LEN)
        .find_map(|entry| {
            let tag = u32::from_le_bytes(entry[0..4].try_into().ok()?);
            if tag != wanted {
                return None;
            }
            filetime_to_utc(u64::from_le_bytes(entry[8..16].try_into().ok()?))
        })
}

/// Convert a Windows FILETIME (100ns ticks since 1601) to UTC.
fn filetime_to_utc(ticks: u64) -> Option<DateTime<Utc>> {
    if ticks == 0 {
        return None;
    }
    let secs = i64::try_from(ticks / 10_000_000).ok()? - FILETIME_UNIX_OFFSET_SECS;
    let nanos = u32::try_from((ticks % 10_000_000) * 100).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

fn date_from_headers(headers: &str) -> Option<DateTime<Utc>> {
    let raw = format!("{}\r\n\r\n", headers.trim_end());
    let parsed = MessageParser::default().parse(raw.as_bytes())?;
    DateTime::from_timestamp(parsed.date()?.to_timestamp(), 0)
}

fn display_sender(name: Option<String>, address: Option<String>) -> String {
    match (name, address) {
        (Some(name), Some(address)) if name != address => format!("{name} <{address}>"),
        (Some(name), _) => name,
        (None, Some(address)) => address,
        (None, None) => String::new(),
    }
}
