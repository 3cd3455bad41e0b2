use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Price, currency and seller taken from one offer entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Offer {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub seller: Option<String>,
}

/// Structured detail for one product page
///
/// `url` always equals the originating locator's `url`. The three offer
/// fields come from the same offer entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub sku: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub brand: Option<String>,

    #[serde(default, deserialize_with = "lenient_images")]
    pub images: Vec<String>,

    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub seller: Option<String>,

    pub url: String,
}

impl DetailRecord {
    /// Creates a record with only its join key set
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            description: None,
            sku: None,
            brand: None,
            images: Vec::new(),
            price: None,
            currency: None,
            seller: None,
            url: url.into(),
        }
    }

    /// Copies the offer triple onto this record
    pub fn apply_offer(&mut self, offer: Offer) {
        self.price = offer.price;
        self.currency = offer.currency;
        self.seller = offer.seller;
    }

    /// Returns the offer triple, if any part of it is present
    pub fn offer(&self) -> Option<Offer> {
        if self.price.is_none() && self.currency.is_none() && self.seller.is_none() {
            return None;
        }
        Some(Offer {
            price: self.price,
            currency: self.currency.clone(),
            seller: self.seller.clone(),
        })
    }
}

/// Accepts a JSON number, a numeric string or null
///
/// Older checkpoint files carry prices exactly as the page declared them,
/// which is sometimes a string.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Number(f64),
        Text(String),
    }

    match Option::<Price>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Price::Number(n)) => Ok(Some(n)),
        Some(Price::Text(s)) => Ok(s.trim().parse::<f64>().ok()),
    }
}

/// Accepts a string, a number, a `{ "name": ... }` object or null
///
/// Older checkpoint files carry these fields exactly as the page declared
/// them, so a numeric SKU or an unflattened brand object can appear. Any
/// other shape reads as `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_value(Value::deserialize(deserializer)?))
}

fn text_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(mut map) => map.remove("name").and_then(text_value),
        _ => None,
    }
}

/// Accepts a list of URLs, a single URL string or null
fn lenient_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
