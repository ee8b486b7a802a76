//! The `verify` command: refresh US prices of an existing export.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use ivory_core::{price_products, validate, AppConfig, CategoryCatalog, CategoryInfo, RunExport};
use ivory_enrich::{EnrichmentEngine, GeminiClient, LlmClient};

use crate::catalog::load_catalog;
use crate::export_file::{read_export, verified_path, write_json};
use crate::inspect::print_export_stats;

pub(crate) async fn run_verify(
    config: &AppConfig,
    path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let export = read_export(path)?;
    let api_key = config
        .gemini_api_key
        .as_deref()
        .context("GEMINI_API_KEY must be set to verify prices")?;

    // Guidance is optional here; an export can outlive its catalog.
    let catalog = load_catalog(config)
        .inspect_err(|e| tracing::warn!(error = %e, "verifying without category pricing guidance"))
        .ok();

    let client = GeminiClient::new(api_key, &config.llm_model, config.request_timeout_secs)
        .context("failed to build LLM client")?;
    let engine = EnrichmentEngine::new(
        client,
        Duration::from_millis(config.llm_delay_ms),
        config.llm_batch_size,
    );

    let (verified, failed_batches) = verify_export(&engine, export, catalog.as_ref()).await?;

    let output = output.map_or_else(|| verified_path(path), Path::to_path_buf);
    write_json(&output, &verified)?;
    println!("Wrote {}", output.display());
    print_export_stats(&verified);
    println!("LLM batches failed: {failed_batches}");

    let issues = validate(&verified);
    if !issues.is_empty() {
        for issue in &issues {
            println!("  - {issue}");
        }
        anyhow::bail!("verified export has {} validation issue(s)", issues.len());
    }
    Ok(())
}

/// Runs the verification pass over every category and reprices it with the
/// export's own exchange rate. Returns the updated export and the number of
/// failed LLM batches.
pub(crate) async fn verify_export<C: LlmClient>(
    engine: &EnrichmentEngine<C>,
    mut export: RunExport,
    catalog: Option<&CategoryCatalog>,
) -> anyhow::Result<(RunExport, usize)> {
    let rate = export
        .exchange_rate_ils_to_usd
        .context("export has no exchange rate; re-run the scrape with enrichment enabled")?;
    let mut failed_batches = 0usize;

    for (group, categories) in &mut export.categories {
        for (key, category) in categories.iter_mut() {
            let info = CategoryInfo {
                key: key.clone(),
                description: category.description.clone(),
                group: group.clone(),
                link: category.url.clone(),
                pricing_guidance: catalog
                    .and_then(|c| c.get(key))
                    .and_then(|c| c.pricing_guidance),
            };

            let products = std::mem::take(&mut category.products)
                .into_iter()
                .map(|p| p.product)
                .collect();
            let outcome = engine.verify(products, &info).await;
            failed_batches += outcome.failures.len();
            category.products = price_products(outcome.products, Some(rate));
        }
    }

    export.recount();
    Ok((export, failed_batches))
}
