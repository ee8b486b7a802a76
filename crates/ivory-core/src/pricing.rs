//! USD conversion and price-ratio computation.
//!
//! The exchange rate is always passed in by the caller. A run fetches it once
//! and threads the same value through every call so that all ratios within
//! one export are comparable.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::products::{EnrichedProduct, PricedProduct};

/// Decimal places kept for USD amounts and ratios.
const MONEY_DP: u32 = 2;

/// Converts an ILS price to USD at `rate`, rounded to cents.
#[must_use]
pub fn price_to_usd(price_ils: Decimal, rate: Decimal) -> Decimal {
    round_money(price_ils * rate)
}

/// Computes `price_usd / us_rrp_usd` rounded to two decimal places.
///
/// Returns `None` when the RRP is absent or not strictly positive. Ratios are
/// never clamped: values below 1.0 or far above it are kept as-is.
#[must_use]
pub fn ratio(price_usd: Decimal, us_rrp_usd: Option<Decimal>) -> Option<Decimal> {
    let rrp = us_rrp_usd.filter(|r| r.is_sign_positive() && !r.is_zero())?;
    price_usd.checked_div(rrp).map(round_money)
}

/// Attaches `price_usd` and `price_ratio` to each product.
///
/// When `rate` is `None` (no-enrich runs, or the rate source was unreachable)
/// both fields are left absent and the products pass through unchanged.
#[must_use]
pub fn price_products(products: Vec<EnrichedProduct>, rate: Option<Decimal>) -> Vec<PricedProduct> {
    products
        .into_iter()
        .map(|product| {
            let price_usd = rate.map(|r| price_to_usd(product.raw.price, r));
            let price_ratio = price_usd.and_then(|usd| ratio(usd, product.enrichment.us_rrp_usd));
            PricedProduct {
                product,
                price_usd,
                price_ratio,
            }
        })
        .collect()
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}
