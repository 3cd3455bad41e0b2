//! Product record extractor
//!
//! Pulls the schema.org `Product` description embedded in a detail page as a
//! `<script type="application/ld+json">` block and maps it to a `DetailRecord`.
//! Pages without such a block, or with blocks that do not parse, yield `None`.

use crate::model::{DetailRecord, Offer};
use scraper::{Html, Selector};
use serde_json::Value;

const PRODUCT_TYPE: &str = "Product";

/// Extracts a product record from a detail page
///
/// The first metadata block (in document order) whose `@type` is `Product`
/// wins. Blocks that fail to parse as JSON are skipped. `price`, `currency`
/// and `seller` come from the first offer entry; without offers all three are
/// `None`.
///
/// # Arguments
///
/// * `html` - The raw page content
/// * `page_url` - URL stamped onto the record
///
/// # Example
///
/// ```
/// use detail_harvest::harvest::extract_record;
///
/// let html = r#"<html><head><script type="application/ld+json">
///     {"@type": "Product", "name": "Yoga Mat", "offers": [{"price": 49.99, "priceCurrency": "AED"}]}
/// </script></head></html>"#;
///
/// let record = extract_record(html, "https://example.com/yoga-mat/p").unwrap();
/// assert_eq!(record.name.as_deref(), Some("Yoga Mat"));
/// assert_eq!(record.price, Some(49.99));
/// ```
pub fn extract_record(html: &str, page_url: &str) -> Option<DetailRecord> {
    let product = find_product_block(html)?;
    Some(map_product(&product, page_url))
}

/// Finds the first JSON-LD object declaring `@type: Product`
pub fn find_product_block(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    for element in document.select(&selector) {
        let text = element.text().collect::<String>();
        let value = match serde_json::from_str::<Value>(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::trace!("Skipping malformed JSON-LD block: {}", e);
                continue;
            }
        };

        if let Some(product) = first_product(value) {
            return Some(product);
        }
    }

    None
}

/// Returns the first product object in a parsed block
///
/// Handles a bare object, a top-level array of objects and an `@graph` list.
fn first_product(value: Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().find_map(first_product),
        Value::Object(mut map) => {
            if is_product_type(map.get("@type")) {
                return Some(Value::Object(map));
            }
            match map.remove("@graph") {
                Some(graph) => first_product(graph),
                None => None,
            }
        }
        _ => None,
    }
}

fn is_product_type(declared: Option<&Value>) -> bool {
    match declared {
        Some(Value::String(t)) => t == PRODUCT_TYPE,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(PRODUCT_TYPE)),
        _ => false,
    }
}

fn map_product(product: &Value, page_url: &str) -> DetailRecord {
    let mut record = DetailRecord::new(page_url);
    record.name = text_field(product.get("name"));
    record.description = text_field(product.get("description"));
    record.sku = text_field(product.get("sku"));
    record.brand = named_field(product.get("brand"));
    record.images = image_list(product.get("image"));

    if let Some(offer) = first_offer(product.get("offers")) {
        record.apply_offer(offer);
    }

    record
}

/// Reads a scalar as text; numbers are accepted since SKUs are often numeric
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads `{ "name": ... }` or a plain string
fn named_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(map) => text_field(map.get("name")),
        other => text_field(Some(other)),
    }
}

fn image_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn first_offer(value: Option<&Value>) -> Option<Offer> {
    let value = value?;
    let entry = match value {
        Value::Array(offers) => offers.first()?,
        Value::Object(_) => value,
        _ => return None,
    };

    Some(Offer {
        price: price_field(entry.get("price")),
        currency: text_field(entry.get("priceCurrency")),
        seller: named_field(entry.get("seller")),
    })
}

fn price_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
