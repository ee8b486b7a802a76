//! Storefront access: page fetching, listing extraction, pagination, and
//! the exchange rate lookup.

pub mod client;
pub mod currency;
pub mod error;
pub mod pagination;
pub mod parse;
mod parse_helpers;
pub mod rate_limit;

pub use client::IvoryClient;
pub use currency::CurrencyRateProvider;
pub use error::ScraperError;
pub use pagination::{collect_category, CategoryCollection, PageSource, MAX_PAGES};
pub use parse::{parse_listing_page, ListingPage};
pub use rate_limit::RateLimiter;
