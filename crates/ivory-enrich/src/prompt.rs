//! Prompt construction for the two enrichment passes.
//!
//! Items are numbered from 1 in batch order; replies refer back to items by
//! that `index`.

use std::fmt::Write as _;

use ivory_core::{CategoryInfo, EnrichedProduct, RawProduct};

/// Price bands used when a category carries no guidance of its own.
pub const DEFAULT_PRICING_GUIDANCE: &str = "\
- For DDR5 RAM: 16GB kits typically $50-80, 32GB kits $80-150, 64GB kits $150-300
- For DDR4 RAM: 16GB kits typically $30-50, 32GB kits $50-90
- For NVMe SSDs: 500GB $40-60, 1TB $60-100, 2TB $100-180";

/// First pass: identify each product and guess its US retail price.
#[must_use]
pub fn extraction_prompt(products: &[RawProduct], category: &CategoryInfo) -> String {
    let mut list = String::new();
    for (i, p) in products.iter().enumerate() {
        let _ = writeln!(list, "{}. {}", i + 1, p.name);
    }

    format!(
        r#"Analyze these {hint} products from an Israeli retailer and extract information.

Products:
{list}
For EACH product, provide a JSON array with objects containing:
- "index": the product number (1, 2, 3...)
- "manufacturer": the brand/manufacturer name (e.g., "Samsung", "Kingston", "ASUS")
- "part_number": the product SKU/model number if identifiable (e.g., "MZ-V9P2T0BW", "SA400S37/960G")
- "description_en": a brief English description of the product
- "us_rrp_usd": estimated US retail price in USD (integer, your best estimate based on current market prices). If unknown, use null.

IMPORTANT:
- Return ONLY a valid JSON array, no markdown formatting
- Use null for unknown values
- For US RRP, estimate based on typical US retail prices for this exact product or very similar products

Example response format:
[{{"index": 1, "manufacturer": "Samsung", "part_number": "990-PRO-2TB", "description_en": "Samsung 990 Pro 2TB NVMe SSD", "us_rrp_usd": 180}}]
"#,
        hint = category.description,
    )
}

/// Second pass: confirm or correct the first-pass price guesses against the
/// category's expected price bands.
#[must_use]
pub fn verification_prompt(products: &[EnrichedProduct], category: &CategoryInfo) -> String {
    let mut list = String::new();
    for (i, p) in products.iter().enumerate() {
        let e = &p.enrichment;
        let _ = write!(
            list,
            "{}. {} - {} (Part: {})",
            i + 1,
            e.manufacturer.as_deref().unwrap_or("?"),
            e.description_en.as_deref().unwrap_or(&p.raw.name),
            e.part_number.as_deref().unwrap_or("N/A"),
        );
        if let Some(guess) = e.us_rrp_usd {
            let _ = write!(list, " [initial estimate: ${guess}]");
        }
        list.push('\n');
    }

    let guidance = category
        .pricing_guidance
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or(DEFAULT_PRICING_GUIDANCE);

    format!(
        r#"You are a computer hardware pricing expert. For each {hint} product below, provide the CURRENT US retail price (MSRP/RRP) in USD. Confirm the initial estimate if it is right, or correct it.

Products:
{list}
IMPORTANT GUIDELINES:
- Use current US retail prices from major retailers (Amazon, Newegg, Best Buy)
{guidance}
- If exact product not available in US, estimate based on similar specs
- Return INTEGER prices only

Return a JSON array with objects containing:
- "index": product number (1, 2, 3...)
- "us_rrp_usd": integer US retail price in USD

Example: [{{"index": 1, "us_rrp_usd": 85}}, {{"index": 2, "us_rrp_usd": 120}}]

Return ONLY the JSON array, no markdown.
"#,
        hint = category.description,
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use ivory_core::Enrichment;

    use super::*;

    fn category(guidance: Option<&str>) -> CategoryInfo {
        CategoryInfo {
            key: "ddr5-memory".to_owned(),
            description: "DDR5 Memory".to_owned(),
            group: "Memory".to_owned(),
            link: "https://www.ivory.co.il/catalog.php?act=cat&id=1".to_owned(),
            pricing_guidance: guidance.map(str::to_owned),
        }
    }

    fn raw(id: &str, name: &str) -> RawProduct {
        RawProduct {
            id: id.to_owned(),
            name: name.to_owned(),
            price: Decimal::from(100),
            currency: "ILS".to_owned(),
            url: String::new(),
            in_stock: true,
        }
    }

    #[test]
    fn extraction_prompt_numbers_items_from_one() {
        let prompt = extraction_prompt(
            &[raw("1", "Kingston Fury 32GB"), raw("2", "G.Skill Trident 64GB")],
            &category(None),
        );
        assert!(prompt.contains("DDR5 Memory products"));
        assert!(prompt.contains("1. Kingston Fury 32GB\n2. G.Skill Trident 64GB\n"));
        assert!(prompt.contains(r#"[{"index": 1, "manufacturer": "Samsung""#));
    }

    #[test]
    fn verification_prompt_lists_identity_and_first_guess() {
        let product = EnrichedProduct {
            raw: raw("1", "זיכרון Kingston"),
            enrichment: Enrichment {
                manufacturer: Some("Kingston".to_owned()),
                part_number: Some("KF560C36BBE-32".to_owned()),
                description_en: Some("Kingston Fury Beast 32GB DDR5-6000".to_owned()),
                us_rrp_usd: Some(Decimal::from(110)),
            },
        };
        let prompt = verification_prompt(&[product], &category(None));
        assert!(prompt.contains(
            "1. Kingston - Kingston Fury Beast 32GB DDR5-6000 (Part: KF560C36BBE-32) [initial estimate: $110]"
        ));
        assert!(prompt.contains("32GB kits $80-150"));
    }

    #[test]
    fn verification_prompt_falls_back_to_name_and_placeholders() {
        let product = EnrichedProduct::unenriched(raw("1", "Unknown RAM stick"));
        let prompt = verification_prompt(&[product], &category(None));
        assert!(prompt.contains("1. ? - Unknown RAM stick (Part: N/A)\n"));
    }

    #[test]
    fn category_guidance_replaces_defaults() {
        let product = EnrichedProduct::unenriched(raw("1", "Some CPU"));
        let prompt = verification_prompt(
            &[product],
            &category(Some("- Desktop CPUs: mid-range $200-350")),
        );
        assert!(prompt.contains("- Desktop CPUs: mid-range $200-350"));
        assert!(!prompt.contains("DDR4 RAM"));
    }
}
