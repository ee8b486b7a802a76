//! Post-hoc consistency checks for a [`RunExport`].
//!
//! Validation never mutates the export; it only reports. An empty issue list
//! means the export is valid, and validating a valid export again yields an
//! empty list again.

use std::fmt;

use rust_decimal::Decimal;

use crate::export::RunExport;
use crate::pricing::price_to_usd;
use crate::products::{PricedProduct, SOURCE_CURRENCY};

/// Allowed absolute difference when re-deriving rounded monetary values.
const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Location of a product inside an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLocation {
    pub group: String,
    pub category: String,
    pub index: usize,
    pub product_id: String,
}

impl fmt::Display for ProductLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}[{}] (id '{}')",
            self.group, self.category, self.index, self.product_id
        )
    }
}

/// One schema or consistency problem found in an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    TotalMismatch {
        declared: usize,
        actual: usize,
    },
    CountMismatch {
        group: String,
        category: String,
        declared: usize,
        actual: usize,
    },
    GroupMismatch {
        group: String,
        category: String,
        declared_group: String,
    },
    MissingField {
        location: ProductLocation,
        field: &'static str,
    },
    UnexpectedCurrency {
        location: ProductLocation,
        currency: String,
    },
    NegativePrice {
        location: ProductLocation,
        price: Decimal,
    },
    UsdMismatch {
        location: ProductLocation,
        expected: Decimal,
        actual: Decimal,
    },
    RatioMismatch {
        location: ProductLocation,
        expected: Decimal,
        actual: Decimal,
    },
    RatioWithoutRrp {
        location: ProductLocation,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalMismatch { declared, actual } => write!(
                f,
                "total_products is {declared} but categories hold {actual} products"
            ),
            Self::CountMismatch {
                group,
                category,
                declared,
                actual,
            } => write!(
                f,
                "{group}/{category}: product_count is {declared} but products has {actual} entries"
            ),
            Self::GroupMismatch {
                group,
                category,
                declared_group,
            } => write!(
                f,
                "{group}/{category}: category declares group '{declared_group}'"
            ),
            Self::MissingField { location, field } => {
                write!(f, "{location}: required field '{field}' is empty")
            }
            Self::UnexpectedCurrency { location, currency } => {
                write!(f, "{location}: currency is '{currency}', expected '{SOURCE_CURRENCY}'")
            }
            Self::NegativePrice { location, price } => {
                write!(f, "{location}: price {price} is negative")
            }
            Self::UsdMismatch {
                location,
                expected,
                actual,
            } => write!(
                f,
                "{location}: price_usd is {actual} but price * rate is {expected}"
            ),
            Self::RatioMismatch {
                location,
                expected,
                actual,
            } => write!(
                f,
                "{location}: price_ratio is {actual} but price_usd / us_rrp_usd is {expected}"
            ),
            Self::RatioWithoutRrp { location } => write!(
                f,
                "{location}: price_ratio is set without a positive us_rrp_usd"
            ),
        }
    }
}

/// Checks counts, required fields, and price arithmetic across the export.
#[must_use]
pub fn validate(export: &RunExport) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut actual_total = 0usize;

    for (group, key, category) in export.iter_categories() {
        let actual = category.products.len();
        actual_total += actual;

        if category.product_count != actual {
            issues.push(ValidationIssue::CountMismatch {
                group: group.to_string(),
                category: key.to_string(),
                declared: category.product_count,
                actual,
            });
        }

        if category.group != group {
            issues.push(ValidationIssue::GroupMismatch {
                group: group.to_string(),
                category: key.to_string(),
                declared_group: category.group.clone(),
            });
        }

        for (index, product) in category.products.iter().enumerate() {
            let location = ProductLocation {
                group: group.to_string(),
                category: key.to_string(),
                index,
                product_id: product.raw().id.clone(),
            };
            check_product(product, export.exchange_rate_ils_to_usd, &location, &mut issues);
        }
    }

    if export.total_products != actual_total {
        issues.push(ValidationIssue::TotalMismatch {
            declared: export.total_products,
            actual: actual_total,
        });
    }

    issues
}

fn check_product(
    product: &PricedProduct,
    rate: Option<Decimal>,
    location: &ProductLocation,
    issues: &mut Vec<ValidationIssue>,
) {
    let raw = product.raw();

    for (field, value) in [("id", &raw.id), ("name", &raw.name), ("url", &raw.url)] {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                location: location.clone(),
                field,
            });
        }
    }

    if raw.currency != SOURCE_CURRENCY {
        issues.push(ValidationIssue::UnexpectedCurrency {
            location: location.clone(),
            currency: raw.currency.clone(),
        });
    }

    if raw.price.is_sign_negative() && !raw.price.is_zero() {
        issues.push(ValidationIssue::NegativePrice {
            location: location.clone(),
            price: raw.price,
        });
    }

    if let (Some(rate), Some(actual)) = (rate, product.price_usd) {
        let expected = price_to_usd(raw.price, rate);
        if (expected - actual).abs() > TOLERANCE {
            issues.push(ValidationIssue::UsdMismatch {
                location: location.clone(),
                expected,
                actual,
            });
        }
    }

    let Some(actual_ratio) = product.price_ratio else {
        return;
    };

    let rrp = product
        .enrichment()
        .us_rrp_usd
        .filter(|r| r.is_sign_positive() && !r.is_zero());
    let (Some(rrp), Some(price_usd)) = (rrp, product.price_usd) else {
        issues.push(ValidationIssue::RatioWithoutRrp {
            location: location.clone(),
        });
        return;
    };

    if let Some(expected) = price_usd.checked_div(rrp) {
        if (expected - actual_ratio).abs() > TOLERANCE {
            issues.push(ValidationIssue::RatioMismatch {
                location: location.clone(),
                expected: expected.round_dp(4),
                actual: actual_ratio,
            });
        }
    }
}
