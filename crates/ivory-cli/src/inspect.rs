//! Read-only commands over an existing export: `validate` and `report`.

use std::path::Path;

use ivory_core::{category_stats, validate, RunExport};

use crate::export_file::read_export;

/// Product counts shown after every run and by `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExportStats {
    pub products: usize,
    pub enriched: usize,
    pub with_ratio: usize,
}

pub(crate) fn export_stats(export: &RunExport) -> ExportStats {
    let mut stats = ExportStats {
        products: 0,
        enriched: 0,
        with_ratio: 0,
    };
    for product in export.products() {
        stats.products += 1;
        if !product.enrichment().is_empty() {
            stats.enriched += 1;
        }
        if product.price_ratio.is_some() {
            stats.with_ratio += 1;
        }
    }
    stats
}

pub(crate) fn print_export_stats(export: &RunExport) {
    let stats = export_stats(export);
    println!("Capture date: {}", export.capture_date.to_rfc3339());
    match export.exchange_rate_ils_to_usd {
        Some(rate) => println!("Exchange rate (ILS→USD): {rate}"),
        None => println!("Exchange rate (ILS→USD): unavailable"),
    }
    println!(
        "Products: {}, enriched: {}, with price ratio: {}",
        stats.products, stats.enriched, stats.with_ratio
    );
}

pub(crate) fn validate_file(path: &Path) -> anyhow::Result<()> {
    let export = read_export(path)?;
    print_export_stats(&export);

    let issues = validate(&export);
    if issues.is_empty() {
        println!("{}: valid", path.display());
        return Ok(());
    }

    println!("{}: {} issue(s)", path.display(), issues.len());
    for issue in &issues {
        println!("  - {issue}");
    }
    anyhow::bail!("{} failed validation", path.display())
}

pub(crate) fn report_file(path: &Path) -> anyhow::Result<()> {
    let export = read_export(path)?;
    let (stats, overall) = category_stats(&export);

    if stats.is_empty() {
        println!("No products with a price ratio in {}", path.display());
        return Ok(());
    }

    println!(
        "{:<14} {:<32} {:>5} {:>6} {:>6} {:>6}",
        "GROUP", "CATEGORY", "N", "MEAN", "MIN", "MAX"
    );
    for s in &stats {
        println!(
            "{:<14} {:<32} {:>5} {:>6} {:>6} {:>6}",
            s.group, s.key, s.count, s.mean, s.min, s.max
        );
    }
    if let Some(overall) = overall {
        println!("Overall mean price ratio: {overall}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ivory_core::{
        assemble, CategoryInfo, CategoryResult, EnrichedProduct, Enrichment, PricedProduct,
        RawProduct,
    };
    use rust_decimal::Decimal;

    use super::*;
    use crate::export_file::write_json;

    fn product(id: &str, manufacturer: Option<&str>, ratio: Option<Decimal>) -> PricedProduct {
        PricedProduct {
            product: EnrichedProduct {
                raw: RawProduct {
                    id: id.to_owned(),
                    name: format!("Product {id}"),
                    price: Decimal::from(100),
                    currency: "ILS".to_owned(),
                    url: format!("https://www.ivory.co.il/catalog.php?id={id}"),
                    in_stock: true,
                },
                enrichment: Enrichment {
                    manufacturer: manufacturer.map(str::to_owned),
                    us_rrp_usd: ratio.map(|_| Decimal::from(10)),
                    ..Enrichment::default()
                },
            },
            price_usd: Some(Decimal::new(3230, 2)),
            price_ratio: ratio,
        }
    }

    fn export(products: Vec<PricedProduct>) -> RunExport {
        assemble(
            Utc::now(),
            Some(Decimal::new(323, 3)),
            vec![CategoryResult {
                info: CategoryInfo {
                    key: "ssd-nvme".to_owned(),
                    description: "SSD NVMe".to_owned(),
                    group: "Storage".to_owned(),
                    link: "https://www.ivory.co.il/catalog.php?act=cat&id=2".to_owned(),
                    pricing_guidance: None,
                },
                products,
            }],
        )
    }

    #[test]
    fn stats_count_enriched_and_ratio_products() {
        let export = export(vec![
            product("1", Some("Samsung"), Some(Decimal::new(323, 2))),
            product("2", Some("WD"), None),
            product("3", None, None),
        ]);
        assert_eq!(
            export_stats(&export),
            ExportStats {
                products: 3,
                enriched: 2,
                with_ratio: 1,
            }
        );
    }

    #[test]
    fn validate_file_accepts_consistent_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("good.json");
        write_json(
            &path,
            &export(vec![product("1", Some("Samsung"), Some(Decimal::new(323, 2)))]),
        )
        .unwrap();
        validate_file(&path).unwrap();
    }

    #[test]
    fn validate_file_fails_on_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut bad = export(vec![product("1", None, None)]);
        bad.total_products = 5;
        write_json(&path, &bad).unwrap();
        assert!(validate_file(&path).is_err());
    }

    #[test]
    fn report_file_handles_export_without_ratios() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.json");
        write_json(&path, &export(vec![product("1", None, None)])).unwrap();
        report_file(&path).unwrap();
    }
}
