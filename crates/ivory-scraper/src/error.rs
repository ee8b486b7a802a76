use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("unrecognizable page markup: {reason}")]
    Parse { reason: String },

    #[error("category '{category}' failed on page {page}: {source}")]
    CategoryFetch {
        category: String,
        page: u32,
        #[source]
        source: Box<ScraperError>,
    },

    #[error("pagination limit reached for {category}: exceeded {max_pages} pages")]
    PaginationLimit { category: String, max_pages: u32 },

    #[error("exchange rate unavailable: {reason}")]
    RateFetch { reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
