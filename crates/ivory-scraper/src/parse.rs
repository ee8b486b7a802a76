//! Extraction of product listings from one category page.
//!
//! ## Observed listing markup
//!
//! Each listing is an `.entry-wrapper` element containing:
//! - an anchor `a[data-product-id]` carrying the product ID and a (usually
//!   relative) `href` to the product page,
//! - a title in `.title_product_catalog` (older templates use
//!   `.main-text-area` or a `div` whose class contains `title`),
//! - one or more `span.price` elements. The Eilat tax-free price is a
//!   `span.price` nested inside an `.eilatprice` container and is never used,
//! - an optional stock badge. Only an explicit out-of-stock marker flips
//!   `in_stock` to `false`.
//!
//! Pagination links carry a `page=N` query parameter.

use std::collections::HashSet;
use std::sync::LazyLock;

use ivory_core::{RawProduct, SOURCE_CURRENCY};
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::parse_helpers::{clean_text, parse_price_text};

static LISTING: LazyLock<Selector> = LazyLock::new(|| css(".entry-wrapper"));
static PRODUCT_ANCHOR: LazyLock<Selector> = LazyLock::new(|| css("a[data-product-id]"));
static NAME_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        ".title_product_catalog",
        ".main-text-area",
        "div[class*='title']",
    ]
    .into_iter()
    .map(css)
    .collect()
});
static ANY_DIV: LazyLock<Selector> = LazyLock::new(|| css("div"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| css("span.price"));
static EILAT_PRICE: LazyLock<Selector> =
    LazyLock::new(|| css(".eilatprice span.price, span.price.eilatprice"));
static OUT_OF_STOCK: LazyLock<Selector> =
    LazyLock::new(|| css(".out-of-stock, .outofstock, .not-available"));
static PAGE_LINK: LazyLock<Selector> = LazyLock::new(|| css("a[href*='page=']"));
static NEXT_LINK: LazyLock<Selector> =
    LazyLock::new(|| css("a[rel~='next'], link[rel~='next']"));
static NUMBERED_PAGE_LINK: LazyLock<Selector> =
    LazyLock::new(|| css(".pagination a, .paging a, .pages a"));
static PAGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]page=(\d+)").expect("valid page param regex"));

/// Hebrew storefront text for "out of stock".
const OUT_OF_STOCK_TEXT: &str = "אזל מהמלאי";

/// Minimum character count for the last-resort name fallback.
const MIN_FALLBACK_NAME_CHARS: usize = 10;

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid static CSS selector")
}

/// Result of parsing one category page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub products: Vec<RawProduct>,
    /// `true` when the page links to a page number greater than the current one.
    pub has_next_page: bool,
    /// Listings discarded for lacking an id, name, or parseable price.
    pub dropped: usize,
}

/// Why a single listing was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    MissingId,
    MissingName,
    MissingPrice,
}

/// Parses a category page into its product listings.
///
/// `base_url` resolves relative product links; `current_page` is the 1-based
/// index of this page and is used to decide whether a later page exists.
///
/// Per-listing defects are tolerated: listings without an id, a name, or a
/// parseable regular price are dropped and counted in
/// [`ListingPage::dropped`].
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] when the markup is empty, which no
/// storefront page (even one without listings) ever is.
pub fn parse_listing_page(
    markup: &str,
    base_url: &Url,
    current_page: u32,
) -> Result<ListingPage, ScraperError> {
    if markup.trim().is_empty() {
        return Err(ScraperError::Parse {
            reason: "page body is empty".to_string(),
        });
    }

    let document = Html::parse_document(markup);
    let mut page = ListingPage {
        has_next_page: has_later_page(&document, current_page),
        ..ListingPage::default()
    };

    for listing in document.select(&LISTING) {
        match extract_listing(listing, base_url) {
            Ok(product) => page.products.push(product),
            Err(reason) => {
                tracing::debug!(?reason, current_page, "dropping listing");
                page.dropped += 1;
            }
        }
    }

    Ok(page)
}

fn extract_listing(listing: ElementRef<'_>, base_url: &Url) -> Result<RawProduct, DropReason> {
    let anchor = listing
        .select(&PRODUCT_ANCHOR)
        .next()
        .ok_or(DropReason::MissingId)?;

    let id = anchor
        .value()
        .attr("data-product-id")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(DropReason::MissingId)?
        .to_string();

    let url = anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map_or_else(String::new, |href| resolve_href(href, base_url));

    let name = extract_name(listing).ok_or(DropReason::MissingName)?;
    let price = extract_regular_price(listing).ok_or(DropReason::MissingPrice)?;

    Ok(RawProduct {
        id,
        name,
        price,
        currency: SOURCE_CURRENCY.to_string(),
        url,
        in_stock: !is_marked_out_of_stock(listing),
    })
}

fn extract_name(listing: ElementRef<'_>) -> Option<String> {
    for selector in NAME_SELECTORS.iter() {
        if let Some(el) = listing.select(selector).next() {
            let name = element_text(el);
            if !name.is_empty() {
                return Some(name);
            }
        }
    }

    // Last resort: the first reasonably long div text that is not a price.
    listing
        .select(&ANY_DIV)
        .map(element_text)
        .find(|text| {
            text.chars().count() > MIN_FALLBACK_NAME_CHARS
                && !text.starts_with('₪')
                && !text.contains("מחיר")
        })
}

/// Returns the first parseable `span.price` that is not an Eilat price.
fn extract_regular_price(listing: ElementRef<'_>) -> Option<rust_decimal::Decimal> {
    let eilat: HashSet<_> = listing.select(&EILAT_PRICE).map(|el| el.id()).collect();

    listing
        .select(&PRICE)
        .filter(|el| !eilat.contains(&el.id()))
        .find_map(|el| parse_price_text(&element_text(el)))
}

fn is_marked_out_of_stock(listing: ElementRef<'_>) -> bool {
    listing.select(&OUT_OF_STOCK).next().is_some()
        || listing.text().any(|t| t.contains(OUT_OF_STOCK_TEXT))
}

/// Detects whether the page advertises a page after `current_page`, either
/// through a `rel="next"` link or a numbered page link.
fn has_later_page(document: &Html, current_page: u32) -> bool {
    if document.select(&NEXT_LINK).next().is_some() {
        return true;
    }

    let from_hrefs = document
        .select(&PAGE_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(page_number_from_href);

    let from_text = document
        .select(&NUMBERED_PAGE_LINK)
        .filter_map(|a| element_text(a).parse::<u32>().ok());

    from_hrefs.chain(from_text).any(|n| n > current_page)
}

fn page_number_from_href(href: &str) -> Option<u32> {
    PAGE_PARAM
        .captures(href)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn resolve_href(href: &str, base_url: &Url) -> String {
    base_url
        .join(href)
        .map_or_else(|_| href.to_string(), |u| u.to_string())
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
