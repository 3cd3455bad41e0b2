use serde::{Deserialize, Serialize};

/// A pointer to one item whose detail page should be fetched
///
/// `url` is the identity key: it joins a `DetailRecord` back to its locator
/// and is the dedup key across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// Display name from the listing page
    pub name: String,

    /// Detail page URL
    pub url: String,
}

impl Locator {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}
