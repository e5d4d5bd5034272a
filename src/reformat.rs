//! Display-side reformatting helpers.
//!
//! Pure functions the display layer applies before rendering: label
//! title-casing, Italian date and phone formatting, birth-place composition
//! and text truncation. No I/O.

use crate::models::Subject;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;

/// Turns a `snake_case` source-system label into a title-cased one
/// (`credit_bureau` becomes `Credit Bureau`).
pub fn to_title_case(input: &str) -> String {
    input
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a date for the Italian locale (`dd/mm/yyyy`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Formats a provenance timestamp for detail cards.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Composes the birth-place breakdown into one line:
/// `City (Province), Region, Country`. Missing parts are skipped; returns
/// `None` when every part is missing.
pub fn birth_place(subject: &Subject) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    match (&subject.city_of_birth, &subject.province_of_birth) {
        (Some(city), Some(province)) => parts.push(format!("{} ({})", city, province)),
        (Some(city), None) => parts.push(city.clone()),
        (None, Some(province)) => parts.push(format!("({})", province)),
        (None, None) => {}
    }
    if let Some(ref region) = subject.region_of_birth {
        parts.push(region.clone());
    }
    if let Some(ref country) = subject.country_of_birth {
        parts.push(country.clone());
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Normalizes an Italian phone number for display.
///
/// Uses the phonenumber library (port of Google's libphonenumber) with the
/// Italian region. Numbers that do not parse as valid Italian numbers are
/// returned unchanged; contact rows carry whatever the source system stored.
pub fn format_it_phone(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }

    match phonenumber::parse(Some(CountryId::IT), raw) {
        Ok(number) if phonenumber::is_valid(&number) => {
            number.format().mode(Mode::National).to_string()
        }
        _ => raw.to_string(),
    }
}

/// Truncates text with an ellipsis at `max_len` characters.
pub fn truncate(text: &str, max_len: usize) -> String {
    let count = text.chars().count();
    if count <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Age in whole years on a given day.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Prepares a subject for rendering: title-cases the provenance labels and
/// fills the composed `place_of_birth` line.
pub fn subject_for_display(mut subject: Subject) -> Subject {
    subject.place_of_birth = birth_place(&subject);
    subject.provenance.source_system = to_title_case(&subject.provenance.source_system);
    subject.provenance.source_details = subject
        .provenance
        .source_details
        .as_deref()
        .map(to_title_case);
    subject
}
