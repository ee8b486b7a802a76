//! Multi-page collection for a single category.

use std::future::Future;

use ivory_core::products::dedupe_last_wins;
use ivory_core::{CategoryInfo, RawProduct};
use reqwest::Url;

use crate::error::ScraperError;
use crate::parse::parse_listing_page;

/// Maximum number of pages fetched for one category before giving up.
/// Guards against markup changes that make every page look like it has a successor.
pub const MAX_PAGES: u32 = 200;

/// Source of raw category page markup.
///
/// [`crate::IvoryClient`] is the HTTP implementation; tests substitute
/// scripted pages.
pub trait PageSource {
    /// Returns the markup of 1-based page `page` of `category`.
    fn fetch_page(
        &self,
        category: &CategoryInfo,
        page: u32,
    ) -> impl Future<Output = Result<String, ScraperError>>;
}

/// Products gathered from every page of one category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCollection {
    pub products: Vec<RawProduct>,
    /// Number of pages fetched.
    pub pages: u32,
    /// Listings dropped across all pages for lacking an id, name, or price.
    pub dropped: usize,
}

/// Fetches and parses pages of `category` starting at page 1.
///
/// Stops after the first page that yields no products, or that does not
/// link to a later page. Products repeated across pages are merged by id,
/// the later record replacing the earlier one in place.
///
/// # Errors
///
/// - [`ScraperError::CategoryFetch`] wrapping the underlying error when any
///   page fails to fetch or parse. Pages are never skipped.
/// - [`ScraperError::PaginationLimit`] when more than [`MAX_PAGES`] pages
///   would be needed.
/// - [`ScraperError::InvalidUrl`] when the category link cannot be parsed.
pub async fn collect_category<S: PageSource>(
    source: &S,
    category: &CategoryInfo,
) -> Result<CategoryCollection, ScraperError> {
    let base_url = link_base(&category.link)?;
    let mut collection = CategoryCollection::default();
    let mut page = 1u32;

    loop {
        if page > MAX_PAGES {
            return Err(ScraperError::PaginationLimit {
                category: category.key.clone(),
                max_pages: MAX_PAGES,
            });
        }

        let wrap = |source: ScraperError| ScraperError::CategoryFetch {
            category: category.key.clone(),
            page,
            source: Box::new(source),
        };

        let markup = source.fetch_page(category, page).await.map_err(wrap)?;
        let parsed = parse_listing_page(&markup, &base_url, page).map_err(wrap)?;

        collection.pages = page;
        collection.dropped += parsed.dropped;

        let found = parsed.products.len();
        tracing::debug!(
            category = %category.key,
            page,
            found,
            dropped = parsed.dropped,
            has_next_page = parsed.has_next_page,
            "parsed category page"
        );

        if found == 0 {
            break;
        }
        collection.products.extend(parsed.products);
        if !parsed.has_next_page {
            break;
        }
        page += 1;
    }

    let before = collection.products.len();
    collection.products = dedupe_last_wins(collection.products);
    if collection.products.len() < before {
        tracing::warn!(
            category = %category.key,
            duplicates = before - collection.products.len(),
            "merged products repeated across pages"
        );
    }

    Ok(collection)
}

/// Site root of a category link, used to resolve relative product hrefs.
pub(crate) fn link_base(link: &str) -> Result<Url, ScraperError> {
    let url = Url::parse(link).map_err(|e| ScraperError::InvalidUrl {
        url: link.to_owned(),
        reason: e.to_string(),
    })?;
    url.join("/").map_err(|e| ScraperError::InvalidUrl {
        url: link.to_owned(),
        reason: e.to_string(),
    })
}
