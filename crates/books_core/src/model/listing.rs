//! Normalization of storefront listing text into `Books` column values.
//!
//! Ingesters that scrape a book storefront see prices like `£51.77`, star
//! ratings spelled as words and stock lines like `In stock (22 available)`.
//! These helpers turn that text into the values the schema stores. No
//! scraping happens in this crate.

use crate::model::book::{Money, ParseMoneyError};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d.]").expect("valid amount regex"));
static AVAILABLE_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+) available\)").expect("valid availability regex"));

/// Parses a displayed price such as `£51.77` or `Â£51.77`.
///
/// Every character other than ASCII digits and `.` is dropped before parsing,
/// so currency symbols and mis-decoded prefixes are ignored.
pub fn parse_money_text(text: &str) -> Result<Money, ParseMoneyError> {
    NON_AMOUNT_RE.replace_all(text, "").parse()
}

/// Maps a word rating (`One` through `Five`) to its number.
pub fn parse_star_rating(word: &str) -> Option<i64> {
    match word.trim() {
        "One" => Some(1),
        "Two" => Some(2),
        "Three" => Some(3),
        "Four" => Some(4),
        "Five" => Some(5),
        _ => None,
    }
}

/// Reads a stock count from an availability line.
///
/// - `In stock (22 available)` -> 22
/// - a count too large for `i64` saturates at `i64::MAX`
/// - `In stock` without a count -> 1
/// - anything else -> 0
pub fn parse_availability_text(text: &str) -> i64 {
    let text = text.trim();
    if let Some(count) = AVAILABLE_COUNT_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
    {
        // The capture is all ASCII digits, so the only parse failure is overflow.
        return count.as_str().parse().unwrap_or(i64::MAX);
    }

    if text.contains("In stock") {
        1
    } else {
        0
    }
}
