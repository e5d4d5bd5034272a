//! Italian fiscal code validation and formatting.
//!
//! A fiscal code is a 16-character structural identifier: 6 letters, 2 digits,
//! 1 letter, 2 digits, 1 letter, 3 digits, 1 letter. Validation here is purely
//! structural; no checksum is computed. All functions are deterministic and do
//! no I/O.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Canonical length of a fiscal code.
pub const FISCAL_CODE_LEN: usize = 16;

/// Group boundaries used for human-readable display: 6/2/1/2/1/3/1.
const DISPLAY_GROUPS: [usize; 7] = [6, 2, 1, 2, 1, 3, 1];

fn fiscal_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Z]{6}[0-9]{2}[A-Z][0-9]{2}[A-Z][0-9]{3}[A-Z]$").unwrap()
    })
}

/// Validation failures for fiscal code input.
///
/// These are always recoverable locally (the caller re-prompts the user) and
/// are never treated as system faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiscalCodeError {
    /// Input was empty after whitespace stripping.
    Empty,
    /// Input was not exactly 16 characters; carries the cleaned length.
    Length(usize),
    /// Input was 16 characters but did not match the structural pattern.
    Format,
}

impl fmt::Display for FiscalCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiscalCodeError::Empty => write!(f, "Fiscal code is required"),
            FiscalCodeError::Length(got) => write!(
                f,
                "Fiscal code must be {} characters (got {})",
                FISCAL_CODE_LEN, got
            ),
            FiscalCodeError::Format => write!(f, "Invalid fiscal code format"),
        }
    }
}

impl std::error::Error for FiscalCodeError {}

/// Strips all whitespace and uppercases the input.
pub fn clean(raw: &str) -> String {
    raw.split_whitespace().collect::<String>().to_uppercase()
}

/// Validates the structural shape of a fiscal code.
///
/// Whitespace is stripped and the input uppercased before the length and
/// pattern checks. On success the canonical 16-character uppercase form is
/// returned.
pub fn validate(raw: &str) -> Result<String, FiscalCodeError> {
    let cleaned = clean(raw);

    if cleaned.is_empty() {
        return Err(FiscalCodeError::Empty);
    }

    // Count characters, not bytes: non-ASCII input must report its visible
    // length before failing the pattern check.
    let char_len = cleaned.chars().count();
    if char_len != FISCAL_CODE_LEN {
        return Err(FiscalCodeError::Length(char_len));
    }

    if !fiscal_code_regex().is_match(&cleaned) {
        return Err(FiscalCodeError::Format);
    }

    Ok(cleaned)
}

/// Relaxed check used while the user is still typing.
///
/// True when the cleaned input is at least 3 characters and consists only of
/// uppercase letters and digits. Gates live search and autocomplete; this is
/// not full validation.
pub fn is_searchable(raw: &str) -> bool {
    let cleaned = clean(raw);
    cleaned.chars().count() >= 3
        && cleaned
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Formats a fiscal code for display.
///
/// A cleaned 16-character input is grouped as `LLLLLL DD L DD L DDD L`;
/// anything else is returned cleaned but otherwise unchanged. Applying the
/// function twice yields the same string.
pub fn format(raw: &str) -> String {
    let cleaned = clean(raw);

    if cleaned.chars().count() != FISCAL_CODE_LEN {
        return cleaned;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    let mut groups = Vec::with_capacity(DISPLAY_GROUPS.len());
    let mut start = 0;
    for width in DISPLAY_GROUPS {
        groups.push(chars[start..start + width].iter().collect::<String>());
        start += width;
    }
    groups.join(" ")
}
