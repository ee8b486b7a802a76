//! ILS → USD exchange rate lookup.
//!
//! Rate sources are public JSON endpoints of the shape
//! `{"rates": {"USD": 0.2712, ...}}`, quoted against ILS. They are tried in
//! order and the first usable rate is cached for the rest of the run.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::error::ScraperError;

/// Decimal places kept on a fetched rate.
const RATE_DP: u32 = 4;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: RatesTable,
}

#[derive(Debug, Deserialize)]
struct RatesTable {
    #[serde(rename = "USD", default, with = "rust_decimal::serde::float_option")]
    usd: Option<Decimal>,
}

/// Fetches the ILS → USD rate at most once per run.
#[derive(Debug)]
pub struct CurrencyRateProvider {
    client: Client,
    sources: Vec<String>,
    cache: OnceCell<Decimal>,
}

impl CurrencyRateProvider {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        sources: Vec<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            sources,
            cache: OnceCell::new(),
        })
    }

    /// Returns the cached rate, fetching it on first use.
    ///
    /// A failed lookup is not cached, so a later call tries the sources again.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::RateFetch`] when every source fails or none
    /// are configured.
    pub async fn get_rate(&self) -> Result<Decimal, ScraperError> {
        self.cache
            .get_or_try_init(|| self.fetch_first_available())
            .await
            .copied()
    }

    async fn fetch_first_available(&self) -> Result<Decimal, ScraperError> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match self.fetch_from(source).await {
                Ok(rate) => {
                    tracing::info!(%source, %rate, "fetched ILS→USD exchange rate");
                    return Ok(rate);
                }
                Err(reason) => {
                    tracing::warn!(%source, %reason, "exchange rate source failed");
                    failures.push(format!("{source}: {reason}"));
                }
            }
        }

        Err(ScraperError::RateFetch {
            reason: if failures.is_empty() {
                "no rate sources configured".to_owned()
            } else {
                failures.join("; ")
            },
        })
    }

    async fn fetch_from(&self, source: &str) -> Result<Decimal, String> {
        let response = self
            .client
            .get(source)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }
        let body: RatesResponse = response.json().await.map_err(|e| e.to_string())?;
        let rate = body
            .rates
            .usd
            .ok_or_else(|| "response has no USD rate".to_owned())?;
        if rate <= Decimal::ZERO {
            return Err(format!("non-positive USD rate {rate}"));
        }
        Ok(rate.round_dp_with_strategy(RATE_DP, RoundingStrategy::MidpointAwayFromZero))
    }
}
