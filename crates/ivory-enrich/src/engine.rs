//! Batch enrichment with a two-pass extract-then-verify protocol.
//!
//! Each batch gets an extraction call (identity, description, first US price
//! guess) followed by a verification call that confirms or corrects the price
//! guesses. A failing call degrades only its own batch; the products in it
//! are still returned, and the failure is recorded in
//! [`EnrichmentOutcome::failures`].

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use ivory_core::{CategoryInfo, EnrichedProduct, Enrichment, RawProduct};
use ivory_scraper::RateLimiter;

use crate::error::EnrichError;
use crate::llm::LlmClient;
use crate::prompt::{extraction_prompt, verification_prompt};
use crate::response::{parse_reply, ItemReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    Extraction,
    Verification,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction => f.write_str("extraction"),
            Self::Verification => f.write_str("verification"),
        }
    }
}

/// A batch whose LLM call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// 0-based batch number within the category.
    pub batch: usize,
    pub stage: BatchStage,
    pub product_ids: Vec<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentOutcome {
    /// Same length and order as the input.
    pub products: Vec<EnrichedProduct>,
    pub failures: Vec<BatchFailure>,
}

pub struct EnrichmentEngine<C> {
    client: C,
    limiter: RateLimiter,
    batch_size: usize,
}

impl<C: LlmClient> EnrichmentEngine<C> {
    /// `call_delay` is the minimum gap between any two LLM calls, including
    /// the two passes of one batch. A `batch_size` of 0 is treated as 1.
    #[must_use]
    pub fn new(client: C, call_delay: Duration, batch_size: usize) -> Self {
        Self {
            client,
            limiter: RateLimiter::new(call_delay),
            batch_size: batch_size.max(1),
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Enriches `products` with both passes, batch by batch.
    pub async fn enrich(
        &self,
        products: Vec<RawProduct>,
        category: &CategoryInfo,
    ) -> EnrichmentOutcome {
        let mut outcome = EnrichmentOutcome {
            products: Vec::with_capacity(products.len()),
            failures: Vec::new(),
        };

        for (batch, chunk) in products.chunks(self.batch_size).enumerate() {
            let first_pass = match self.extract(chunk, category).await {
                Ok(enriched) => enriched,
                Err(err) => {
                    outcome.record(batch, BatchStage::Extraction, chunk.iter(), &err, category);
                    outcome
                        .products
                        .extend(chunk.iter().cloned().map(EnrichedProduct::unenriched));
                    continue;
                }
            };

            let verified = self
                .verify_batch(first_pass, batch, category, &mut outcome.failures)
                .await;
            outcome.products.extend(verified);
        }

        log_summary(category, "enrichment", &outcome);
        outcome
    }

    /// Runs only the verification pass over already-enriched products.
    ///
    /// Used to refresh the US price of a previous export without repeating
    /// extraction. Products keep their current values when a batch fails.
    pub async fn verify(
        &self,
        products: Vec<EnrichedProduct>,
        category: &CategoryInfo,
    ) -> EnrichmentOutcome {
        let mut outcome = EnrichmentOutcome {
            products: Vec::with_capacity(products.len()),
            failures: Vec::new(),
        };

        for (batch, chunk) in products.chunks(self.batch_size).enumerate() {
            let verified = self
                .verify_batch(chunk.to_vec(), batch, category, &mut outcome.failures)
                .await;
            outcome.products.extend(verified);
        }

        log_summary(category, "verification", &outcome);
        outcome
    }

    async fn extract(
        &self,
        chunk: &[RawProduct],
        category: &CategoryInfo,
    ) -> Result<Vec<EnrichedProduct>, EnrichError> {
        let items = self.call(&extraction_prompt(chunk, category)).await?;
        Ok(chunk
            .iter()
            .enumerate()
            .map(|(i, raw)| EnrichedProduct {
                raw: raw.clone(),
                enrichment: items
                    .get(&(i + 1))
                    .map(enrichment_from_reply)
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn verify_batch(
        &self,
        mut batch_products: Vec<EnrichedProduct>,
        batch: usize,
        category: &CategoryInfo,
        failures: &mut Vec<BatchFailure>,
    ) -> Vec<EnrichedProduct> {
        match self
            .call(&verification_prompt(&batch_products, category))
            .await
        {
            Ok(items) => {
                for (i, product) in batch_products.iter_mut().enumerate() {
                    if let Some(price) = items.get(&(i + 1)).and_then(|item| item.us_rrp_usd) {
                        product.enrichment.us_rrp_usd = Some(price);
                    }
                }
            }
            Err(err) => {
                let failure = BatchFailure {
                    batch,
                    stage: BatchStage::Verification,
                    product_ids: batch_products.iter().map(|p| p.raw.id.clone()).collect(),
                    error: err.to_string(),
                };
                tracing::warn!(
                    category = %category.key,
                    batch,
                    error = %err,
                    "verification pass failed, keeping first-pass prices"
                );
                failures.push(failure);
            }
        }
        batch_products
    }

    /// Waits for the call gap, sends `prompt`, and indexes the reply items
    /// by position. A later item with a repeated index replaces the earlier.
    async fn call(&self, prompt: &str) -> Result<HashMap<usize, ItemReply>, EnrichError> {
        self.limiter.wait().await;
        let reply = self.client.generate(prompt).await?;
        Ok(parse_reply(&reply)?
            .into_iter()
            .map(|item| (item.index, item))
            .collect())
    }
}

impl EnrichmentOutcome {
    fn record<'a>(
        &mut self,
        batch: usize,
        stage: BatchStage,
        products: impl Iterator<Item = &'a RawProduct>,
        err: &EnrichError,
        category: &CategoryInfo,
    ) {
        tracing::warn!(
            category = %category.key,
            batch,
            %stage,
            error = %err,
            "LLM batch failed, products left unenriched"
        );
        self.failures.push(BatchFailure {
            batch,
            stage,
            product_ids: products.map(|p| p.id.clone()).collect(),
            error: err.to_string(),
        });
    }
}

fn enrichment_from_reply(item: &ItemReply) -> Enrichment {
    Enrichment {
        manufacturer: item.manufacturer.clone(),
        part_number: item.part_number.clone(),
        description_en: item.description_en.clone(),
        us_rrp_usd: item.us_rrp_usd,
    }
}

fn log_summary(category: &CategoryInfo, pass: &str, outcome: &EnrichmentOutcome) {
    let with_rrp = outcome
        .products
        .iter()
        .filter(|p| p.enrichment.us_rrp_usd.is_some())
        .count();
    tracing::info!(
        category = %category.key,
        pass,
        products = outcome.products.len(),
        with_rrp,
        failed_batches = outcome.failures.len(),
        "LLM pass complete"
    );
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
