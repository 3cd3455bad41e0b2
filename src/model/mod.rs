//! Data model shared by the harvest pipeline and the checkpoint store
//!
//! - `Locator`: one item to fetch, as emitted by the listing crawl
//! - `DetailRecord`: the structured result extracted from one detail page
//! - `Offer`: the price/currency/seller triple pulled from a single offer entry

mod locator;
mod record;

pub use locator::Locator;
pub use record::{DetailRecord, Offer};
