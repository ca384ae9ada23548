//! Amount parsing and formatting. Every stored amount is integer cents.

use thiserror::Error;

/// Largest accepted unit price, 1 billion in major units.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must be a number like 12 or 12.50")]
    NotANumber,
    #[error("amount must not be negative")]
    Negative,
    #[error("amount has more than two decimal places")]
    TooPrecise,
    #[error("amount is too large")]
    TooLarge,
}

/// Parse a decimal amount ("12", "12.5", "1,250.00") into cents.
pub fn parse_amount(raw: &str) -> Result<i64, AmountError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return Err(AmountError::Empty);
    }
    if cleaned.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::NotANumber);
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::NotANumber);
    }
    if fraction.len() > 2 {
        return Err(AmountError::TooPrecise);
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::TooLarge)?
    };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| AmountError::NotANumber)? * 10,
        _ => fraction.parse().map_err(|_| AmountError::NotANumber)?,
    };

    let cents = whole_value
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction_value))
        .ok_or(AmountError::TooLarge)?;

    if cents > MAX_UNIT_PRICE_CENTS {
        return Err(AmountError::TooLarge);
    }
    Ok(cents)
}

/// Format cents as a plain decimal with two places and thousands separators.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let fraction = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{fraction:02}")
}
