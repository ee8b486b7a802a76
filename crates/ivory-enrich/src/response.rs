//! Tolerant parsing of model replies.
//!
//! Models are asked for a bare JSON array but regularly wrap it in markdown
//! fences, add prose around it, or truncate it mid-object. Parsing tries,
//! in order: the whole reply, the outermost `[...]` slice, then each flat
//! `{...}` object on its own. Whatever items survive are returned.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};

use crate::error::EnrichError;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("valid fence regex"));
static PRICE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid price regex"));
static FLAT_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("valid object regex"));

/// One item of a model reply, keyed by its 1-based position in the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemReply {
    pub index: usize,
    pub manufacturer: Option<String>,
    pub part_number: Option<String>,
    pub description_en: Option<String>,
    pub us_rrp_usd: Option<Decimal>,
}

/// Parses a model reply into per-item fields.
///
/// Items without a usable `index` are skipped. Unknown or placeholder values
/// (`null`, empty strings, non-positive prices) become `None`.
///
/// # Errors
///
/// Returns [`EnrichError::MalformedResponse`] when not a single item can be
/// recovered from the reply.
pub fn parse_reply(text: &str) -> Result<Vec<ItemReply>, EnrichError> {
    let body = strip_fences(text.trim());

    let objects = whole_reply(body)
        .or_else(|| bracketed_slice(body))
        .unwrap_or_else(|| individual_objects(body));

    let items: Vec<ItemReply> = objects.iter().filter_map(item_from_object).collect();
    if items.is_empty() {
        let preview: String = body.chars().take(120).collect();
        return Err(EnrichError::MalformedResponse(format!(
            "no recoverable items in reply: {preview}"
        )));
    }
    Ok(items)
}

fn strip_fences(text: &str) -> &str {
    FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str())
}

fn whole_reply(body: &str) -> Option<Vec<Map<String, Value>>> {
    serde_json::from_str::<Value>(body).ok().and_then(objects_of)
}

fn bracketed_slice(body: &str) -> Option<Vec<Map<String, Value>>> {
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&body[start..=end])
        .ok()
        .and_then(objects_of)
}

fn individual_objects(body: &str) -> Vec<Map<String, Value>> {
    FLAT_OBJECT
        .find_iter(body)
        .filter_map(|m| match serde_json::from_str::<Value>(m.as_str()) {
            Ok(Value::Object(obj)) => Some(obj),
            _ => None,
        })
        .collect()
}

/// Extracts item objects from a parsed reply: an array of objects, a single
/// item object, or an object wrapping the array under some key.
fn objects_of(value: Value) -> Option<Vec<Map<String, Value>>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(obj) => Some(obj),
                    _ => None,
                })
                .collect(),
        ),
        Value::Object(obj) if obj.contains_key("index") => Some(vec![obj]),
        Value::Object(obj) => obj
            .into_iter()
            .find_map(|(_, v)| v.is_array().then_some(v))
            .and_then(objects_of),
        _ => None,
    }
}

fn item_from_object(obj: &Map<String, Value>) -> Option<ItemReply> {
    let index = obj.get("index").and_then(index_value)?;
    Some(ItemReply {
        index,
        manufacturer: text_field(obj, "manufacturer"),
        part_number: text_field(obj, "part_number"),
        description_en: text_field(obj, "description_en"),
        us_rrp_usd: obj.get("us_rrp_usd").and_then(price_value),
    })
}

fn index_value(value: &Value) -> Option<usize> {
    let index = match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (index > 0).then_some(index)
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let s = obj.get(key)?.as_str()?.trim();
    let placeholder = s.is_empty()
        || s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("unknown")
        || s.eq_ignore_ascii_case("n/a");
    (!placeholder).then(|| s.to_owned())
}

fn price_value(value: &Value) -> Option<Decimal> {
    let price = match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => price_from_text(s),
        _ => None,
    }?;
    (price > Decimal::ZERO)
        .then(|| price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Reads a price written as text, such as `"$1,299.99"` or `"95 USD"`.
///
/// Ranges (`"80-150"`) and scaled amounts (`"1.2k"`) are left absent.
fn price_from_text(text: &str) -> Option<Decimal> {
    let mut amounts = PRICE_AMOUNT.find_iter(text);
    let amount = amounts.next()?;
    if amounts.next().is_some() {
        return None;
    }
    if text[amount.end()..]
        .chars()
        .next()
        .is_some_and(char::is_alphabetic)
    {
        return None;
    }
    let cleaned: String = amount.as_str().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}
