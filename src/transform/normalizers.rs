//! Per-field normalizers. Each one maps raw scraped text to a typed value or a
//! [`ParseError`]; none of them panic or touch anything outside their input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{INVALID_RATING_MARKER, UNAVAILABLE_MARKER};
use crate::error::ParseError;

pub type ParseResult<T> = std::result::Result<T, ParseError>;

static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\d+(?:[.,]\d+)?)").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static COLOR_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;]").unwrap());
static SIZE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^size[:\s]*").unwrap());
static GENDER_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^gender[:\s]*").unwrap());

fn non_empty<'a>(field: &'static str, raw: Option<&'a str>) -> ParseResult<&'a str> {
    match raw {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ParseError::Empty(field)),
    }
}

fn parse_decimal(field: &'static str, token: &str) -> ParseResult<f64> {
    token
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| ParseError::Invalid {
            field,
            value: token.to_string(),
        })
}

/// Converts a `$`-prefixed price into an integer amount at `exchange_rate`.
///
/// Rounds half to even, e.g. `$2.5` at rate 1 gives 2 and `$3.5` gives 4.
pub fn normalize_price(raw: Option<&str>, exchange_rate: u32) -> ParseResult<i64> {
    let text = non_empty("price", raw)?.trim();
    if text.to_lowercase().contains(UNAVAILABLE_MARKER) {
        return Err(ParseError::Unavailable(text.to_string()));
    }

    let amount = PRICE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ParseError::Invalid {
            field: "price",
            value: text.to_string(),
        })?;
    let value = parse_decimal("price", amount.as_str())?;

    let converted = (value * f64::from(exchange_rate)).round_ties_even();
    if !converted.is_finite() || converted > i64::MAX as f64 {
        return Err(ParseError::Invalid {
            field: "price",
            value: text.to_string(),
        });
    }
    Ok(converted as i64)
}

/// Extracts the first number of a rating, so `"4.8 / 5"` yields `4.8`.
pub fn normalize_rating(raw: Option<&str>) -> ParseResult<f64> {
    let text = non_empty("rating", raw)?.trim();
    let invalid = || ParseError::Invalid {
        field: "rating",
        value: text.to_string(),
    };

    if text.contains(INVALID_RATING_MARKER) || !text.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let token = NUMBER_RE.find(text).ok_or_else(invalid)?;
    parse_decimal("rating", token.as_str())
}

/// Counts product colors.
///
/// A digit run always wins (`"3 Colors"` -> 3, also for `"3 Colors, Red"`);
/// otherwise the comma/semicolon separated names are counted.
pub fn normalize_colors(raw: Option<&str>) -> ParseResult<i64> {
    let text = raw.ok_or(ParseError::Empty("colors"))?.trim();
    let invalid = || ParseError::Invalid {
        field: "colors",
        value: text.to_string(),
    };

    if let Some(digits) = DIGITS_RE.find(text) {
        return digits.as_str().parse::<i64>().map_err(|_| invalid());
    }

    let count = COLOR_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .count();
    if count == 0 {
        return Err(invalid());
    }
    i64::try_from(count).map_err(|_| invalid())
}

fn strip_label(field: &'static str, raw: Option<&str>, prefix: &Regex) -> ParseResult<String> {
    let text = non_empty(field, raw)?.trim();
    Ok(prefix.replace(text, "").into_owned())
}

/// Trims and strips a leading `Size:` label.
pub fn normalize_size(raw: Option<&str>) -> ParseResult<String> {
    strip_label("size", raw, &SIZE_PREFIX_RE)
}

/// Trims and strips a leading `Gender:` label.
pub fn normalize_gender(raw: Option<&str>) -> ParseResult<String> {
    strip_label("gender", raw, &GENDER_PREFIX_RE)
}
