//! Statistics over a checkpoint file
//!
//! Used by `--stats` to inspect the output of a finished or interrupted run
//! without fetching anything.

use crate::model::DetailRecord;
use crate::storage::load_records;
use crate::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Number of sellers listed by `print_statistics`
const TOP_SELLERS: usize = 10;

/// Checkpoint statistics summary
#[derive(Debug, Clone, Default)]
pub struct CheckpointStatistics {
    /// Total number of records
    pub total_records: usize,

    /// Records carrying a price
    pub with_price: usize,

    /// Records with no offer data at all
    pub without_offer: usize,

    /// Records with a non-empty image list
    pub with_images: usize,

    /// Number of distinct brand names
    pub distinct_brands: usize,

    /// Record count per currency code
    pub by_currency: BTreeMap<String, usize>,

    /// Sellers ordered by record count, most frequent first
    pub top_sellers: Vec<(String, usize)>,
}

impl CheckpointStatistics {
    /// Computes statistics for a set of records
    pub fn from_records(records: &[DetailRecord]) -> Self {
        let mut brands = HashSet::new();
        let mut by_currency = BTreeMap::new();
        let mut sellers: HashMap<&str, usize> = HashMap::new();
        let mut stats = Self {
            total_records: records.len(),
            ..Default::default()
        };

        for record in records {
            if record.price.is_some() {
                stats.with_price += 1;
            }
            if record.offer().is_none() {
                stats.without_offer += 1;
            }
            if !record.images.is_empty() {
                stats.with_images += 1;
            }
            if let Some(brand) = &record.brand {
                brands.insert(brand.as_str());
            }
            if let Some(currency) = &record.currency {
                *by_currency.entry(currency.clone()).or_insert(0) += 1;
            }
            if let Some(seller) = &record.seller {
                *sellers.entry(seller.as_str()).or_insert(0) += 1;
            }
        }

        let mut top_sellers: Vec<(String, usize)> = sellers
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        top_sellers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        stats.distinct_brands = brands.len();
        stats.by_currency = by_currency;
        stats.top_sellers = top_sellers;
        stats
    }
}

/// Loads a checkpoint file and computes its statistics
///
/// # Arguments
///
/// * `path` - The checkpoint file to read
///
/// # Returns
///
/// * `Ok(CheckpointStatistics)` - Successfully computed statistics
/// * `Err(HarvestError)` - The file is missing or is not a record array
pub fn load_statistics(path: &Path) -> Result<CheckpointStatistics> {
    let records = load_records(path)?;
    Ok(CheckpointStatistics::from_records(&records))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CheckpointStatistics) {
    println!("=== Checkpoint Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!(
        "  With price: {} ({:.1}%)",
        stats.with_price,
        percentage(stats.with_price, stats.total_records)
    );
    println!("  Without offer data: {}", stats.without_offer);
    println!("  With images: {}", stats.with_images);
    println!("  Distinct brands: {}", stats.distinct_brands);
    println!();

    if !stats.by_currency.is_empty() {
        println!("Records by Currency:");
        for (currency, count) in &stats.by_currency {
            println!("  {}: {}", currency, count);
        }
        println!();
    }

    if !stats.top_sellers.is_empty() {
        println!("Top Sellers:");
        for (seller, count) in stats.top_sellers.iter().take(TOP_SELLERS) {
            println!("  - {} ({})", seller, count);
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, brand: &str, seller: Option<&str>, price: Option<f64>) -> DetailRecord {
        let mut record = DetailRecord::new(url);
        record.brand = Some(brand.to_string());
        record.seller = seller.map(str::to_string);
        record.price = price;
        if price.is_some() {
            record.currency = Some("AED".to_string());
        }
        record
    }

    #[test]
    fn test_statistics_from_records() {
        let records = vec![
            record("https://a.example/1", "Zen", Some("Shop A"), Some(10.0)),
            record("https://a.example/2", "Zen", Some("Shop B"), Some(12.5)),
            record("https://a.example/3", "Flow", Some("Shop A"), None),
            record("https://a.example/4", "Flow", None, None),
        ];

        let stats = CheckpointStatistics::from_records(&records);

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.with_price, 2);
        assert_eq!(stats.without_offer, 1);
        assert_eq!(stats.distinct_brands, 2);
        assert_eq!(stats.by_currency.get("AED"), Some(&2));
        assert_eq!(stats.top_sellers[0], ("Shop A".to_string(), 2));
    }

    #[test]
    fn test_empty_statistics() {
        let stats = CheckpointStatistics::from_records(&[]);
        assert_eq!(stats.total_records, 0);
        assert!(stats.top_sellers.is_empty());
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_load_statistics_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_statistics(&dir.path().join("absent.json"));
        assert!(result.is_err());
    }
}
