//! Per-category price-ratio statistics for a finished export.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::export::RunExport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStats {
    pub group: String,
    pub key: String,
    pub description: String,
    /// Number of products with a `price_ratio`.
    pub count: usize,
    pub mean: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

/// Summarizes `price_ratio` per category, sorted ascending by mean.
///
/// Categories without any ratio are omitted. The second element is the mean
/// across every ratio in the export, or `None` when there are none.
#[must_use]
pub fn category_stats(export: &RunExport) -> (Vec<CategoryStats>, Option<Decimal>) {
    let mut stats = Vec::new();
    let mut all_sum = Decimal::ZERO;
    let mut all_count = 0usize;

    for (group, key, category) in export.iter_categories() {
        let ratios: Vec<Decimal> = category
            .products
            .iter()
            .filter_map(|p| p.price_ratio)
            .collect();

        let (Some(&min), Some(&max)) = (ratios.iter().min(), ratios.iter().max()) else {
            continue;
        };

        let sum: Decimal = ratios.iter().sum();
        all_sum += sum;
        all_count += ratios.len();

        stats.push(CategoryStats {
            group: group.to_string(),
            key: key.to_string(),
            description: category.description.clone(),
            count: ratios.len(),
            mean: mean(sum, ratios.len()),
            min,
            max,
        });
    }

    stats.sort_by(|a, b| a.mean.cmp(&b.mean).then_with(|| a.key.cmp(&b.key)));

    let overall = (all_count > 0).then(|| mean(all_sum, all_count));
    (stats, overall)
}

fn mean(sum: Decimal, count: usize) -> Decimal {
    (sum / Decimal::from(count)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::categories::CategoryInfo;
    use crate::export::{assemble, CategoryResult};
    use crate::products::{EnrichedProduct, PricedProduct, RawProduct, SOURCE_CURRENCY};

    fn priced(id: &str, ratio: Option<Decimal>) -> PricedProduct {
        PricedProduct {
            product: EnrichedProduct::unenriched(RawProduct {
                id: id.to_string(),
                name: id.to_string(),
                price: Decimal::from(100),
                currency: SOURCE_CURRENCY.to_string(),
                url: format!("https://www.ivory.co.il/{id}"),
                in_stock: true,
            }),
            price_usd: Some(Decimal::from(32)),
            price_ratio: ratio,
        }
    }

    fn result(key: &str, products: Vec<PricedProduct>) -> CategoryResult {
        CategoryResult {
            info: CategoryInfo {
                key: key.to_string(),
                description: key.to_uppercase(),
                group: "Parts".to_string(),
                link: format!("https://www.ivory.co.il/{key}"),
                pricing_guidance: None,
            },
            products,
        }
    }

    #[test]
    fn stats_sorted_by_mean_and_skip_empty_categories() {
        let export = assemble(
            Utc::now(),
            Some(Decimal::new(32, 2)),
            vec![
                result(
                    "ram",
                    vec![
                        priced("1", Some(Decimal::new(550, 2))),
                        priced("2", Some(Decimal::new(450, 2))),
                    ],
                ),
                result("cpu", vec![priced("3", Some(Decimal::new(120, 2)))]),
                result("case", vec![priced("4", None)]),
            ],
        );

        let (stats, overall) = category_stats(&export);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].key, "cpu");
        assert_eq!(stats[1].key, "ram");
        assert_eq!(stats[1].count, 2);
        assert_eq!(stats[1].mean, Decimal::from(5));
        assert_eq!(stats[1].min, Decimal::new(450, 2));
        assert_eq!(stats[1].max, Decimal::new(550, 2));
        // (5.5 + 4.5 + 1.2) / 3 = 3.733..
        assert_eq!(overall, Some(Decimal::new(373, 2)));
    }

    #[test]
    fn no_ratios_means_no_overall() {
        let export = assemble(Utc::now(), None, vec![result("case", vec![priced("1", None)])]);
        let (stats, overall) = category_stats(&export);
        assert!(stats.is_empty());
        assert!(overall.is_none());
    }
}
