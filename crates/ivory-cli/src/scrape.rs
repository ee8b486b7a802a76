//! The `scrape` command: collect, enrich, price, export, validate.
//!
//! Categories are processed one after another. A category whose pages cannot
//! all be fetched is left out of the export and reported; the run only fails
//! when no category produced a single product.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use ivory_core::{
    assemble, price_products, validate, AppConfig, CategoryInfo, CategoryResult, EnrichedProduct,
};
use ivory_enrich::{EnrichmentEngine, GeminiClient, LlmClient};
use ivory_scraper::{collect_category, CurrencyRateProvider, IvoryClient, PageSource};
use rust_decimal::Decimal;

use crate::catalog::{load_catalog, select_categories};
use crate::export_file::{write_export, DEFAULT_PREFIX};
use crate::inspect::print_export_stats;

#[derive(Debug, Clone)]
pub(crate) struct ScrapeOptions {
    pub categories: Vec<String>,
    pub no_enrich: bool,
    pub output_dir: Option<PathBuf>,
}

/// A category that was dropped from the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FailedCategory {
    pub key: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub(crate) struct RunOutcome {
    pub results: Vec<CategoryResult>,
    pub failed: Vec<FailedCategory>,
    pub failed_batches: usize,
    pub dropped_listings: usize,
}

impl RunOutcome {
    pub(crate) fn product_count(&self) -> usize {
        self.results.iter().map(|r| r.products.len()).sum()
    }
}

pub(crate) async fn run_scrape(config: &AppConfig, options: ScrapeOptions) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let (categories, unknown) = select_categories(&catalog, &options.categories);
    for key in &unknown {
        tracing::warn!(category = %key, "unknown category key, skipping");
        eprintln!("Unknown category '{key}'. Run `ivory categories` to list valid keys.");
    }
    if categories.is_empty() {
        anyhow::bail!("no categories to scrape");
    }

    let client = IvoryClient::new(
        &config.base_url,
        config.request_timeout_secs,
        &config.user_agent,
        config.request_delay_ms,
        config.max_retries,
        config.retry_backoff_base_secs,
    )
    .context("failed to build storefront client")?;
    client
        .preflight()
        .await
        .with_context(|| format!("storefront {} is not reachable", config.base_url))?;

    let rate = if options.no_enrich {
        None
    } else {
        fetch_rate(config).await
    };

    let engine = if options.no_enrich {
        None
    } else {
        build_engine(config)?
    };

    tracing::info!(
        categories = categories.len(),
        enrich = engine.is_some(),
        rate = ?rate,
        "starting scrape"
    );
    let outcome = run_categories(&client, engine.as_ref(), rate, categories.clone()).await;

    for failed in &outcome.failed {
        eprintln!("Category '{}' failed: {}", failed.key, failed.error);
    }
    if outcome.product_count() == 0 {
        anyhow::bail!(
            "no products were collected ({} of {} categories failed)",
            outcome.failed.len(),
            categories.len()
        );
    }

    let prefix = match categories.as_slice() {
        [single] => single.key.as_str(),
        _ => DEFAULT_PREFIX,
    };
    let failed_batches = outcome.failed_batches;
    let dropped_listings = outcome.dropped_listings;
    let failed_categories = outcome.failed.len();

    let export = assemble(Utc::now(), rate, outcome.results);
    let output_dir = options
        .output_dir
        .unwrap_or_else(|| config.output_dir.clone());
    let written = write_export(&output_dir, prefix, &export)?;

    println!("Wrote {}", written.timestamped.display());
    println!("Updated {}", written.latest.display());
    print_export_stats(&export);
    println!(
        "Categories failed: {failed_categories}, LLM batches failed: {failed_batches}, listings dropped: {dropped_listings}"
    );

    let issues = validate(&export);
    if issues.is_empty() {
        println!("Validation passed");
    } else {
        for issue in &issues {
            println!("  - {issue}");
        }
        anyhow::bail!("written export has {} validation issue(s)", issues.len());
    }

    if failed_categories > 0 {
        tracing::warn!(
            failed = failed_categories,
            "run completed with failed categories"
        );
    }
    Ok(())
}

/// Looks up the exchange rate, logging instead of failing when no source
/// answers. Without a rate the export carries no USD prices or ratios.
async fn fetch_rate(config: &AppConfig) -> Option<Decimal> {
    let provider = match CurrencyRateProvider::new(
        config.rate_sources.clone(),
        config.request_timeout_secs,
        &config.user_agent,
    ) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(error = %e, "failed to build exchange rate client");
            return None;
        }
    };
    match provider.get_rate().await {
        Ok(rate) => Some(rate),
        Err(e) => {
            tracing::error!(error = %e, "exchange rate unavailable, skipping USD prices and ratios");
            None
        }
    }
}

fn build_engine(config: &AppConfig) -> anyhow::Result<Option<EnrichmentEngine<GeminiClient>>> {
    let Some(api_key) = config.gemini_api_key.as_deref() else {
        tracing::warn!("GEMINI_API_KEY is not set, products will not be enriched");
        return Ok(None);
    };
    let client = GeminiClient::new(api_key, &config.llm_model, config.request_timeout_secs)
        .context("failed to build LLM client")?;
    Ok(Some(EnrichmentEngine::new(
        client,
        Duration::from_millis(config.llm_delay_ms),
        config.llm_batch_size,
    )))
}

/// Collects, enriches, and prices each category in turn.
pub(crate) async fn run_categories<S, C>(
    source: &S,
    engine: Option<&EnrichmentEngine<C>>,
    rate: Option<Decimal>,
    categories: Vec<CategoryInfo>,
) -> RunOutcome
where
    S: PageSource,
    C: LlmClient,
{
    let mut outcome = RunOutcome::default();
    let total = categories.len();

    for (i, info) in categories.into_iter().enumerate() {
        tracing::info!(
            category = %info.key,
            group = %info.group,
            position = i + 1,
            total,
            "scraping category"
        );

        let collection = match collect_category(source, &info).await {
            Ok(collection) => collection,
            Err(e) => {
                tracing::error!(category = %info.key, error = %e, "category aborted");
                outcome.failed.push(FailedCategory {
                    key: info.key,
                    error: e.to_string(),
                });
                continue;
            }
        };
        outcome.dropped_listings += collection.dropped;

        let enriched = match engine {
            Some(engine) if !collection.products.is_empty() => {
                let result = engine.enrich(collection.products, &info).await;
                outcome.failed_batches += result.failures.len();
                result.products
            }
            _ => collection
                .products
                .into_iter()
                .map(EnrichedProduct::unenriched)
                .collect(),
        };

        let products = price_products(enriched, rate);
        tracing::info!(
            category = %info.key,
            products = products.len(),
            pages = collection.pages,
            "category complete"
        );
        outcome.results.push(CategoryResult { info, products });
    }

    outcome
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
