//! The persisted export document and its assembly from per-category results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryInfo;
use crate::products::PricedProduct;

/// Value of the export's `source` field.
pub const EXPORT_SOURCE: &str = "ivory.co.il";

/// One category's products as written to the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryExport {
    pub description: String,
    pub group: String,
    pub url: String,
    pub product_count: usize,
    pub products: Vec<PricedProduct>,
}

/// Root export document. Built once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExport {
    pub capture_date: DateTime<Utc>,
    pub source: String,
    #[serde(default, with = "crate::products::nullable_float")]
    pub exchange_rate_ils_to_usd: Option<Decimal>,
    pub total_products: usize,
    /// group label → category key → category.
    pub categories: BTreeMap<String, BTreeMap<String, CategoryExport>>,
}

impl RunExport {
    /// Iterates `(group, category_key, category)` in key order.
    pub fn iter_categories(&self) -> impl Iterator<Item = (&str, &str, &CategoryExport)> {
        self.categories.iter().flat_map(|(group, cats)| {
            cats.iter()
                .map(move |(key, cat)| (group.as_str(), key.as_str(), cat))
        })
    }

    /// Mutable counterpart of [`Self::iter_categories`].
    pub fn iter_categories_mut(&mut self) -> impl Iterator<Item = &mut CategoryExport> {
        self.categories
            .values_mut()
            .flat_map(BTreeMap::values_mut)
    }

    /// Iterates every product across all categories.
    pub fn products(&self) -> impl Iterator<Item = &PricedProduct> {
        self.iter_categories()
            .flat_map(|(_, _, cat)| cat.products.iter())
    }

    /// Recomputes every `product_count` and `total_products` from the
    /// actual array lengths.
    pub fn recount(&mut self) {
        let mut total = 0usize;
        for cat in self.iter_categories_mut() {
            cat.product_count = cat.products.len();
            total += cat.product_count;
        }
        self.total_products = total;
    }
}

/// The outcome of scraping (and possibly enriching and pricing) one category.
#[derive(Debug, Clone)]
pub struct CategoryResult {
    pub info: CategoryInfo,
    pub products: Vec<PricedProduct>,
}

/// Groups category results by their group label and computes all counts.
///
/// Counts are derived from the product arrays, never from the inputs. If the
/// same category key appears twice the later result replaces the earlier one.
#[must_use]
pub fn assemble(
    capture_date: DateTime<Utc>,
    rate: Option<Decimal>,
    results: Vec<CategoryResult>,
) -> RunExport {
    let mut categories: BTreeMap<String, BTreeMap<String, CategoryExport>> = BTreeMap::new();

    for result in results {
        let CategoryResult { info, products } = result;
        let export = CategoryExport {
            description: info.description,
            group: info.group.clone(),
            url: info.link,
            product_count: products.len(),
            products,
        };
        categories
            .entry(info.group)
            .or_default()
            .insert(info.key, export);
    }

    let mut export = RunExport {
        capture_date,
        source: EXPORT_SOURCE.to_string(),
        exchange_rate_ils_to_usd: rate,
        total_products: 0,
        categories,
    };
    export.recount();
    export
}
