//! Text-level helpers for listing extraction.
//!
//! These work on already-extracted element text and know nothing about the
//! DOM. See [`crate::parse`] for how they are applied to a listing.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Markers introducing the Eilat (tax-free) price variant. Anything after
/// the first marker is discarded before a price is parsed.
const EILAT_MARKERS: &[&str] = &["eilat", "אילת"];

/// Parses a shelf price such as `"₪1,290"` or `"1,290.90 ₪"`.
///
/// Strips the shekel sign and thousands separators, and ignores any Eilat
/// variant that follows the regular price (`"₪1,290 (Eilat: ₪1,100)"` →
/// `1290`). Returns `None` when no number precedes the Eilat marker.
#[must_use]
pub(crate) fn parse_price_text(text: &str) -> Option<Decimal> {
    let regular = strip_eilat_variant(text);
    let token = first_numeric_token(regular)?;
    let cleaned: String = token.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// Cuts `text` at the first Eilat marker, and at an opening parenthesis once
/// a digit has been seen (the parenthesised part is the variant).
fn strip_eilat_variant(text: &str) -> &str {
    let lower = text.to_lowercase();
    let mut cut = text.len();

    // Lowercasing only changes ASCII letters here, so byte offsets into
    // `lower` line up with `text` for the markers we search for.
    if lower.len() == text.len() {
        for marker in EILAT_MARKERS {
            if let Some(pos) = lower.find(marker) {
                cut = cut.min(pos);
            }
        }
    } else {
        for marker in EILAT_MARKERS {
            if let Some(pos) = text.find(marker) {
                cut = cut.min(pos);
            }
        }
    }

    let head = &text[..cut];
    if let Some(paren) = head.find('(') {
        if head[..paren].chars().any(|c| c.is_ascii_digit()) {
            return &head[..paren];
        }
    }
    head
}

/// Returns the first run of digits, commas and dots that contains a digit.
fn first_numeric_token(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b',' || **b == b'.')
        .count();
    Some(&text[start..start + len])
}

/// Collapses internal whitespace runs and trims the ends.
#[must_use]
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
