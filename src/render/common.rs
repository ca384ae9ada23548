//! Common helpers for document generation.

use chrono::{DateTime, Utc};
use std::path::Path;

/// Format a timestamp for printed documents (e.g. "19 October 2026").
pub fn format_document_date(at: &DateTime<Utc>) -> String {
    at.format("%-d %B %Y").to_string()
}

/// Format a timestamp with time of day, used by the history pages.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Lowercase ASCII slug for use in filenames.
pub fn slugify(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_' || ch == '.') && !last_dash && !result.is_empty() {
            result.push('-');
            last_dash = true;
        }
    }

    let trimmed = result.trim_matches('-');
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    trimmed.chars().take(40).collect::<String>().trim_end_matches('-').to_string()
}

/// Templates bundled with the crate.
pub fn bundled_template_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp.", "client"), "acme-corp");
        assert_eq!(slugify("  Dupont & Fils  ", "client"), "dupont-fils");
        assert_eq!(slugify("Ünïcode", "client"), "ncode");
        assert_eq!(slugify("!!!", "client"), "client");
    }

    #[test]
    fn test_slugify_truncates() {
        let slug = slugify(&"a".repeat(100), "client");
        assert_eq!(slug.len(), 40);
    }

    #[test]
    fn test_format_dates() {
        let at = Utc.with_ymd_and_hms(2026, 10, 9, 14, 5, 0).unwrap();
        assert_eq!(format_document_date(&at), "9 October 2026");
        assert_eq!(format_timestamp(&at), "2026-10-09 14:05 UTC");
    }
}
