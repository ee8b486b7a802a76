use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency of every price scraped from the storefront.
pub const SOURCE_CURRENCY: &str = "ILS";

/// A product listing as extracted from one category page, before any
/// enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    /// Storefront product ID from the listing's `data-product-id` attribute.
    pub id: String,
    /// Display name in the source language (Hebrew), whitespace-trimmed.
    pub name: String,
    /// Regular shelf price in ILS. Eilat (tax-free) prices are never stored here.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Always [`SOURCE_CURRENCY`].
    pub currency: String,
    /// Absolute product page URL.
    pub url: String,
    pub in_stock: bool,
}

/// Manufacturer and pricing metadata attached by the enrichment pass.
///
/// Every field is optional: an absent value means the model could not
/// determine it, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default, with = "nullable_float")]
    pub us_rrp_usd: Option<Decimal>,
}

impl Enrichment {
    /// Returns `true` when no field was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manufacturer.is_none()
            && self.part_number.is_none()
            && self.description_en.is_none()
            && self.us_rrp_usd.is_none()
    }
}

/// A [`RawProduct`] plus whatever [`Enrichment`] could be resolved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProduct {
    #[serde(flatten)]
    pub raw: RawProduct,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl EnrichedProduct {
    /// Wraps a raw product with every enrichment field absent.
    #[must_use]
    pub fn unenriched(raw: RawProduct) -> Self {
        Self {
            raw,
            enrichment: Enrichment::default(),
        }
    }
}

impl From<RawProduct> for EnrichedProduct {
    fn from(raw: RawProduct) -> Self {
        Self::unenriched(raw)
    }
}

/// Terminal product record as written to the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: EnrichedProduct,
    /// Shelf price converted to USD at the run's exchange rate, cent precision.
    /// Absent only when the run has no exchange rate.
    #[serde(default, with = "nullable_float")]
    pub price_usd: Option<Decimal>,
    /// `price_usd / us_rrp_usd`; absent when the RRP is absent or non-positive.
    #[serde(default, with = "nullable_float")]
    pub price_ratio: Option<Decimal>,
}

impl PricedProduct {
    #[must_use]
    pub fn raw(&self) -> &RawProduct {
        &self.product.raw
    }

    #[must_use]
    pub fn enrichment(&self) -> &Enrichment {
        &self.product.enrichment
    }
}

/// Optional decimals written as JSON numbers or `null`.
///
/// `rust_decimal::serde::float_option` rejects `null` behind
/// `#[serde(flatten)]`, so reads go through `Option<f64>`.
pub(crate) mod nullable_float {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float_option::serialize(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(|n| {
                // `f64` display is the shortest form that reads back exactly.
                Decimal::from_str(&n.to_string())
                    .map_err(|e| de::Error::custom(format!("invalid decimal {n}: {e}")))
            })
            .transpose()
    }
}

/// Merges products sharing an `id` so the last occurrence wins while keeping
/// the position of the first one.
#[must_use]
pub fn dedupe_last_wins(products: Vec<RawProduct>) -> Vec<RawProduct> {
    let mut out: Vec<RawProduct> = Vec::with_capacity(products.len());
    let mut positions: std::collections::HashMap<String, usize> =
        std::collections::HashMap::with_capacity(products.len());

    for product in products {
        if let Some(&idx) = positions.get(&product.id) {
            out[idx] = product;
        } else {
            positions.insert(product.id.clone(), out.len());
            out.push(product);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw(id: &str, name: &str, price: i64) -> RawProduct {
        RawProduct {
            id: id.to_string(),
            name: name.to_string(),
            price: Decimal::from(price),
            currency: SOURCE_CURRENCY.to_string(),
            url: format!("https://www.ivory.co.il/catalog.php?id={id}"),
            in_stock: true,
        }
    }

    #[test]
    fn priced_product_serializes_flat_schema() {
        let priced = PricedProduct {
            product: EnrichedProduct {
                raw: make_raw("51234", "זיכרון DDR5 32GB", 1290),
                enrichment: Enrichment {
                    manufacturer: Some("Kingston".to_string()),
                    part_number: Some("KF560C36BBEK2-32".to_string()),
                    description_en: Some("Kingston Fury Beast 32GB DDR5".to_string()),
                    us_rrp_usd: Some(Decimal::from(170)),
                },
            },
            price_usd: Some(Decimal::new(41667, 2)),
            price_ratio: Some(Decimal::new(245, 2)),
        };

        let value = serde_json::to_value(&priced).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "name",
            "price",
            "currency",
            "url",
            "in_stock",
            "manufacturer",
            "part_number",
            "description_en",
            "us_rrp_usd",
            "price_usd",
            "price_ratio",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj.len(), 12);
        assert_eq!(value["price_usd"].as_f64(), Some(416.67));
        assert_eq!(value["price"].as_f64(), Some(1290.0));
    }

    #[test]
    fn unenriched_product_serializes_nulls() {
        let priced = PricedProduct {
            product: EnrichedProduct::unenriched(make_raw("1", "מוצר", 10)),
            price_usd: None,
            price_ratio: None,
        };
        let value = serde_json::to_value(&priced).unwrap();
        assert!(value["manufacturer"].is_null());
        assert!(value["us_rrp_usd"].is_null());
        assert!(value["price_ratio"].is_null());
    }

    #[test]
    fn priced_product_deserializes_without_enrichment_keys() {
        let json = r#"{
            "id": "9", "name": "מקלדת", "price": 199, "currency": "ILS",
            "url": "https://www.ivory.co.il/catalog.php?id=9", "in_stock": false
        }"#;
        let priced: PricedProduct = serde_json::from_str(json).unwrap();
        assert_eq!(priced.raw().price, Decimal::from(199));
        assert!(!priced.raw().in_stock);
        assert!(priced.enrichment().is_empty());
        assert!(priced.price_usd.is_none());
    }

    #[test]
    fn null_prices_read_back_through_flattened_fields() {
        let json = r#"{
            "id": "1", "name": "מוצר", "price": 10, "currency": "ILS",
            "url": "https://www.ivory.co.il/catalog.php?id=1", "in_stock": true,
            "manufacturer": null, "part_number": null, "description_en": null,
            "us_rrp_usd": null, "price_usd": 3.23, "price_ratio": null
        }"#;
        let priced: PricedProduct = serde_json::from_str(json).unwrap();
        assert!(priced.enrichment().us_rrp_usd.is_none());
        assert_eq!(priced.price_usd, Some(Decimal::new(323, 2)));
        assert!(priced.price_ratio.is_none());
    }

    #[test]
    fn priced_product_survives_json_roundtrip() {
        let priced = PricedProduct {
            product: EnrichedProduct {
                raw: make_raw("7", "SSD 1TB", 349),
                enrichment: Enrichment {
                    us_rrp_usd: Some(Decimal::new(8999, 2)),
                    ..Enrichment::default()
                },
            },
            price_usd: Some(Decimal::new(11273, 2)),
            price_ratio: Some(Decimal::new(125, 2)),
        };
        let json = serde_json::to_string(&priced).unwrap();
        let back: PricedProduct = serde_json::from_str(&json).unwrap();
        assert_eq!(back, priced);

        let bare = PricedProduct {
            product: EnrichedProduct::unenriched(make_raw("8", "HDD", 199)),
            price_usd: None,
            price_ratio: None,
        };
        let json = serde_json::to_string(&bare).unwrap();
        let back: PricedProduct = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bare);
    }

    #[test]
    fn dedupe_last_wins_keeps_first_position() {
        let products = vec![
            make_raw("a", "first a", 1),
            make_raw("b", "b", 2),
            make_raw("a", "second a", 3),
        ];
        let deduped = dedupe_last_wins(products);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "a");
        assert_eq!(deduped[0].name, "second a");
        assert_eq!(deduped[1].id, "b");
    }

    #[test]
    fn enrichment_is_empty_by_default() {
        assert!(Enrichment::default().is_empty());
        let partial = Enrichment {
            manufacturer: Some("ASUS".to_string()),
            ..Enrichment::default()
        };
        assert!(!partial.is_empty());
    }
}
