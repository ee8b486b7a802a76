use rust_decimal::Decimal;

use super::*;

fn base() -> Url {
    Url::parse("https://www.ivory.co.il/").unwrap()
}

fn listing(id: &str, name: &str, price_html: &str, extra: &str) -> String {
    format!(
        r#"<div class="entry-wrapper">
             <a data-product-id="{id}" href="/catalog.php?id={id}">
               <div class="title_product_catalog">{name}</div>
             </a>
             {price_html}
             {extra}
           </div>"#
    )
}

fn page(listings: &[String], pagination: &str) -> String {
    format!(
        "<html><body><div class=\"products\">{}</div>{pagination}</body></html>",
        listings.join("\n")
    )
}

#[test]
fn extracts_basic_listing() {
    let html = page(
        &[listing(
            "51234",
            "זיכרון Kingston Fury 32GB DDR5",
            r#"<span class="price">₪499</span>"#,
            "",
        )],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(parsed.products.len(), 1);
    let p = &parsed.products[0];
    assert_eq!(p.id, "51234");
    assert_eq!(p.name, "זיכרון Kingston Fury 32GB DDR5");
    assert_eq!(p.price, Decimal::from(499));
    assert_eq!(p.currency, "ILS");
    assert_eq!(p.url, "https://www.ivory.co.il/catalog.php?id=51234");
    assert!(p.in_stock);
    assert_eq!(parsed.dropped, 0);
    assert!(!parsed.has_next_page);
}

#[test]
fn eilat_price_in_text_is_discarded() {
    let html = page(
        &[listing(
            "1",
            "Samsung 990 PRO 2TB",
            r#"<span class="price">₪1,290 (Eilat: ₪1,100)</span>"#,
            "",
        )],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(parsed.products[0].price, Decimal::from(1290));
}

#[test]
fn eilat_price_container_is_discarded() {
    let html = page(
        &[listing(
            "1",
            "Samsung 990 PRO 2TB",
            r#"<div class="eilatprice"><span class="price">₪1,100</span></div>
               <span class="price">₪1,290</span>"#,
            "",
        )],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(parsed.products[0].price, Decimal::from(1290));
}

#[test]
fn listing_with_only_eilat_price_is_dropped() {
    let html = page(
        &[listing(
            "1",
            "Samsung 990 PRO 2TB",
            r#"<div class="eilatprice"><span class="price">₪1,100</span></div>"#,
            "",
        )],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert!(parsed.products.is_empty());
    assert_eq!(parsed.dropped, 1);
}

#[test]
fn missing_price_skips_only_that_listing() {
    let html = page(
        &[
            listing("1", "Product one name", "", ""),
            listing("2", "Product two name", r#"<span class="price">₪250</span>"#, ""),
        ],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(parsed.products.len(), 1);
    assert_eq!(parsed.products[0].id, "2");
    assert_eq!(parsed.dropped, 1);
}

#[test]
fn unparseable_first_price_falls_through_to_next() {
    let html = page(
        &[listing(
            "1",
            "Product name here",
            r#"<span class="price">call us</span><span class="price">₪2,100</span>"#,
            "",
        )],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(parsed.products[0].price, Decimal::from(2100));
}

#[test]
fn listing_without_id_or_name_is_dropped_and_counted() {
    let no_id = r#"<div class="entry-wrapper">
        <a href="/catalog.php?id=3"><div class="title_product_catalog">No id here</div></a>
        <span class="price">₪10</span></div>"#
        .to_string();
    let empty_id = listing("  ", "Blank id product", r#"<span class="price">₪10</span>"#, "");
    let no_name = r#"<div class="entry-wrapper">
        <a data-product-id="4" href="/catalog.php?id=4"></a>
        <span class="price">₪10</span></div>"#
        .to_string();
    let html = page(&[no_id, empty_id, no_name], "");
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert!(parsed.products.is_empty());
    assert_eq!(parsed.dropped, 3);
}

#[test]
fn name_falls_back_to_alternate_selector() {
    let html = page(
        &[r#"<div class="entry-wrapper">
              <a data-product-id="7" href="/catalog.php?id=7"></a>
              <div class="main-text-area">מעבד AMD Ryzen 7 7800X3D</div>
              <span class="price">₪1,790</span></div>"#
            .to_string()],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(parsed.products[0].name, "מעבד AMD Ryzen 7 7800X3D");
}

#[test]
fn name_falls_back_to_long_div_text() {
    let html = page(
        &[r#"<div class="entry-wrapper">
              <a data-product-id="8" href="/catalog.php?id=8"></a>
              <div>₪ 300</div>
              <div>ספק כוח Corsair RM850x 850W</div>
              <span class="price">₪599</span></div>"#
            .to_string()],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(parsed.products[0].name, "ספק כוח Corsair RM850x 850W");
}

#[test]
fn explicit_out_of_stock_marker_clears_in_stock() {
    let html = page(
        &[
            listing(
                "1",
                "Product with badge",
                r#"<span class="price">₪100</span>"#,
                r#"<span class="out-of-stock">Out</span>"#,
            ),
            listing(
                "2",
                "Product with text",
                r#"<span class="price">₪100</span>"#,
                "<div>אזל מהמלאי</div>",
            ),
            listing(
                "3",
                "Product without marker",
                r#"<span class="price">₪100</span>"#,
                "",
            ),
        ],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    let stock: Vec<bool> = parsed.products.iter().map(|p| p.in_stock).collect();
    assert_eq!(stock, vec![false, false, true]);
}

#[test]
fn absolute_product_url_is_kept() {
    let html = page(
        &[r#"<div class="entry-wrapper">
              <a data-product-id="9" href="https://www.ivory.co.il/catalog.php?id=9&amp;x=1">
                <div class="title_product_catalog">Absolute link product</div></a>
              <span class="price">₪20</span></div>"#
            .to_string()],
        "",
    );
    let parsed = parse_listing_page(&html, &base(), 1).unwrap();
    assert_eq!(
        parsed.products[0].url,
        "https://www.ivory.co.il/catalog.php?id=9&x=1"
    );
}

#[test]
fn detects_later_page_from_href() {
    let html = page(
        &[listing("1", "Product name one", r#"<span class="price">₪1</span>"#, "")],
        r#"<div class="pagination"><a href="?act=cat&page=1">1</a><a href="?act=cat&page=3">3</a></div>"#,
    );
    assert!(parse_listing_page(&html, &base(), 2).unwrap().has_next_page);
    assert!(!parse_listing_page(&html, &base(), 3).unwrap().has_next_page);
}

#[test]
fn detects_later_page_from_rel_next() {
    let html = page(&[], r#"<a rel="next" href="/more">הבא</a>"#);
    assert!(parse_listing_page(&html, &base(), 1).unwrap().has_next_page);
}

#[test]
fn detects_later_page_from_numbered_link_text() {
    let html = page(&[], r#"<div class="paging"><a href="javascript:go(2)">2</a></div>"#);
    assert!(parse_listing_page(&html, &base(), 1).unwrap().has_next_page);
    assert!(!parse_listing_page(&html, &base(), 2).unwrap().has_next_page);
}

#[test]
fn page_without_listings_is_empty_not_error() {
    let parsed = parse_listing_page("<html><body><p>אין מוצרים</p></body></html>", &base(), 1)
        .unwrap();
    assert!(parsed.products.is_empty());
    assert_eq!(parsed.dropped, 0);
}

#[test]
fn empty_markup_is_parse_error() {
    let err = parse_listing_page("   \n", &base(), 1).unwrap_err();
    assert!(matches!(err, ScraperError::Parse { .. }));
}

#[test]
fn page_number_from_href_reads_query_param() {
    assert_eq!(page_number_from_href("/cat.php?page=4"), Some(4));
    assert_eq!(page_number_from_href("/cat.php?x=1&page=12#top"), Some(12));
    assert_eq!(page_number_from_href("/cat.php?subpage=4"), None);
}
