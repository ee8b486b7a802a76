use std::time::Duration;

use ivory_core::CategoryInfo;
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::pagination::PageSource;
use crate::rate_limit::{retry_with_backoff, RateLimiter};

/// HTTP client for the storefront's category listing pages.
///
/// Every request (including retries) waits on a shared [`RateLimiter`] so
/// successive fetches are spaced by the configured request delay. 429 and
/// network failures are retried with exponential backoff; 404 and other
/// non-2xx responses are returned as typed errors on the first occurrence.
#[derive(Debug)]
pub struct IvoryClient {
    client: Client,
    base_url: Url,
    limiter: RateLimiter,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl IvoryClient {
    /// Creates a client for the storefront rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `base_url` is not an absolute URL.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        request_delay_ms: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let base_url = Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            limiter: RateLimiter::from_millis(request_delay_ms),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Checks that the storefront answers at all before a run starts.
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`Self::fetch_url`].
    pub async fn preflight(&self) -> Result<(), ScraperError> {
        let url = self.base_url.to_string();
        self.fetch_url(&url).await.map(|body| {
            tracing::debug!(%url, bytes = body.len(), "storefront reachable");
        })
    }

    /// Fetches `url` and returns the response body as text.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx (not retried).
    /// - [`ScraperError::Http`]: network failure or timeout after all retries.
    pub async fn fetch_url(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            self.limiter.wait().await;
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScraperError::RateLimited {
                    domain: extract_domain(url),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }
}

impl PageSource for IvoryClient {
    async fn fetch_page(&self, category: &CategoryInfo, page: u32) -> Result<String, ScraperError> {
        let url = page_url(&category.link, page)?;
        tracing::debug!(category = %category.key, page, %url, "fetching category page");
        self.fetch_url(&url).await
    }
}

/// Builds the URL of 1-based page `page` for a category link.
///
/// Page 1 is the link itself; later pages set the `page` query parameter,
/// replacing any value already present.
pub(crate) fn page_url(link: &str, page: u32) -> Result<String, ScraperError> {
    if page <= 1 {
        return Ok(link.to_owned());
    }

    let mut url = Url::parse(link).map_err(|e| ScraperError::InvalidUrl {
        url: link.to_owned(),
        reason: e.to_string(),
    })?;
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

/// Extracts the host from `url` for rate-limit error messages, falling back
/// to the full string when it does not parse.
fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
