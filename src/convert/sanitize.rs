//! Input validation for free text that ends up inside output files.
//!
//! Every name, file name, and phone number a user types goes through here
//! before it reaches a formatter.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Longest contact name accepted.
pub const MAX_NAME_LEN: usize = 100;

/// Longest file stem accepted (before the extension).
pub const MAX_FILE_STEM_LEN: usize = 64;

/// Digits with the usual separators, at least one digit, optional leading `+`.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9()\-. ]*[0-9][0-9()\-. ]*$").expect("phone pattern is valid")
});

/// Validate a single phone number. Surrounding whitespace is trimmed.
pub fn phone_number(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty {
            field: "phone number",
        });
    }
    if !PHONE_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidNumber {
            line: 1,
            value: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Split text on newlines and validate every non-blank line as a number.
///
/// Blank lines are skipped. Errors carry the 1-based line number of the
/// first offending line.
pub fn phone_numbers(text: &str) -> Result<Vec<String>, ValidationError> {
    let mut numbers = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !PHONE_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidNumber {
                line: idx + 1,
                value: trimmed.to_string(),
            });
        }
        numbers.push(trimmed.to_string());
    }

    if numbers.is_empty() {
        return Err(ValidationError::Empty {
            field: "list of numbers",
        });
    }
    Ok(numbers)
}

/// Validate a contact display name.
pub fn contact_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty {
            field: "contact name",
        });
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidCharacters {
            field: "contact name",
            value: trimmed.to_string(),
        });
    }
    let length = trimmed.chars().count();
    if length > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "contact name",
            length,
            max: MAX_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Reduce a user-supplied file name to a safe stem.
///
/// Keeps letters, digits, spaces, `-` and `_`; everything else (dots, path
/// separators, emoji) is dropped. A stem that ends up empty is rejected.
pub fn file_stem(raw: &str) -> Result<String, ValidationError> {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = kept.trim();

    if stem.is_empty() {
        return Err(ValidationError::Empty { field: "file name" });
    }
    let length = stem.chars().count();
    if length > MAX_FILE_STEM_LEN {
        return Err(ValidationError::TooLong {
            field: "file name",
            length,
            max: MAX_FILE_STEM_LEN,
        });
    }
    Ok(stem.to_string())
}

/// Parse a partition size. Anything that is not a positive integer means
/// "no limit".
pub fn partition_size(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<usize>().ok().filter(|n| *n > 0)
}
