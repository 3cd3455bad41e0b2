use detail_harvest::config::{Config, HarvestConfig, PathsConfig, UserAgentConfig};
use detail_harvest::harvest::{plan_harvest, run_harvest, HarvestOptions};
use detail_harvest::storage::load_records;
use detail_harvest::{DetailRecord, HarvestError, ItemOutcome, Locator};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &Path, concurrency: usize, delay_secs: f64) -> Config {
    Config {
        harvest: HarvestConfig {
            delay_secs,
            concurrency,
            fetch_timeout_secs: 5.0,
            max_retries: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        },
        paths: PathsConfig {
            input: dir.join("locators.json"),
            partial: dir.join("out/partial.json"),
            final_output: dir.join("out/final.json"),
            prior: None,
        },
    }
}

fn product_page(name: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title>
        <script type="application/ld+json">{{
            "@context": "https://schema.org",
            "@type": "Product",
            "name": "{name}",
            "brand": {{"@type": "Brand", "name": "Zen"}},
            "offers": [{{"price": 49.99, "priceCurrency": "AED", "seller": {{"name": "Shop"}}}}]
        }}</script></head><body>{name}</body></html>"#
    )
}

fn item_path(i: usize) -> String {
    format!("/item-{}/p", i)
}

fn locators(server: &MockServer, range: std::ops::Range<usize>) -> Vec<Locator> {
    range
        .map(|i| Locator::new(format!("Item {}", i), format!("{}{}", server.uri(), item_path(i))))
        .collect()
}

fn write_input(config: &Config, locators: &[Locator]) {
    let json = serde_json::to_string_pretty(locators).unwrap();
    std::fs::write(&config.paths.input, json).unwrap();
}

/// Mounts a product page for every index in `range` except `failing`, which get 404
async fn mount_items(server: &MockServer, range: std::ops::Range<usize>, failing: &[usize]) {
    for i in range {
        let response = if failing.contains(&i) {
            ResponseTemplate::new(404)
        } else {
            ResponseTemplate::new(200)
                .set_body_string(product_page(&format!("Item {}", i)))
                .insert_header("content-type", "text/html")
        };
        Mock::given(method("GET"))
            .and(path(item_path(i)))
            .respond_with(response)
            .mount(server)
            .await;
    }
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

fn read_output(path: &PathBuf) -> Vec<DetailRecord> {
    load_records(path).expect("Failed to read checkpoint")
}

#[tokio::test]
async fn test_full_harvest_with_failures() {
    let server = MockServer::start().await;
    mount_items(&server, 0..12, &[3, 8]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 5, 0.0);
    write_input(&config, &locators(&server, 0..12));

    let report = run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("Harvest failed");

    assert_eq!(report.attempted, 12);
    assert_eq!(report.extracted, 10);
    assert_eq!(report.outcome_count(ItemOutcome::HttpStatus), 2);
    assert_eq!(report.batches_completed, 3);
    assert_eq!(report.total_records, 10);

    let final_records = read_output(&config.paths.final_output);
    let urls: HashSet<_> = final_records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(final_records.len(), 10);
    assert_eq!(urls.len(), 10);
    assert!(!urls.contains(&format!("{}{}", server.uri(), item_path(3))));

    let first = &final_records[0];
    assert_eq!(first.name.as_deref(), Some("Item 0"));
    assert_eq!(first.brand.as_deref(), Some("Zen"));
    assert_eq!(first.price, Some(49.99));
    assert_eq!(first.currency.as_deref(), Some("AED"));
    assert_eq!(first.seller.as_deref(), Some("Shop"));

    let partial_records = read_output(&config.paths.partial);
    assert_eq!(partial_records, final_records);
}

#[tokio::test]
async fn test_resume_with_extended_input() {
    let server = MockServer::start().await;
    mount_items(&server, 0..12, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 5, 0.0);

    write_input(&config, &locators(&server, 0..8));
    run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("First run failed");
    assert_eq!(request_count(&server).await, 8);

    write_input(&config, &locators(&server, 0..12));
    let report = run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("Second run failed");

    assert_eq!(request_count(&server).await, 12);
    assert_eq!(report.skipped_prior, 8);
    assert_eq!(report.attempted, 4);

    let final_records = read_output(&config.paths.final_output);
    let urls: Vec<_> = final_records.iter().map(|r| r.url.clone()).collect();
    let expected: Vec<_> = locators(&server, 0..12).into_iter().map(|l| l.url).collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn test_failed_locators_are_refetched_on_rerun() {
    let server = MockServer::start().await;
    let failing = [2, 5, 7, 10];

    // Failing items answer 404 once, then fall through to the product page
    for &i in &failing {
        Mock::given(method("GET"))
            .and(path(item_path(i)))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    mount_items(&server, 0..12, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 5, 0.0);
    write_input(&config, &locators(&server, 0..12));

    let first = run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("First run failed");
    assert_eq!(first.extracted, 8);
    assert_eq!(first.outcome_count(ItemOutcome::HttpStatus), 4);
    assert_eq!(read_output(&config.paths.partial).len(), 8);
    assert_eq!(request_count(&server).await, 12);

    let second = run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("Second run failed");

    assert_eq!(second.skipped_prior, 8);
    assert_eq!(second.attempted, 4);
    assert_eq!(second.extracted, 4);
    assert_eq!(request_count(&server).await, 16);

    let final_records = read_output(&config.paths.final_output);
    let urls: HashSet<_> = final_records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(final_records.len(), 12);
    assert_eq!(urls.len(), 12);

    let recovered: Vec<_> = final_records[8..].iter().map(|r| r.url.clone()).collect();
    let expected: Vec<_> = failing
        .iter()
        .map(|&i| format!("{}{}", server.uri(), item_path(i)))
        .collect();
    assert_eq!(recovered, expected);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;
    mount_items(&server, 0..6, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, 0.0);
    write_input(&config, &locators(&server, 0..6));

    run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("First run failed");
    let first = read_output(&config.paths.final_output);

    let report = run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("Second run failed");

    assert_eq!(report.attempted, 0);
    assert_eq!(report.batches_planned, 0);
    assert_eq!(request_count(&server).await, 6);
    assert_eq!(read_output(&config.paths.final_output), first);
}

#[tokio::test]
async fn test_fresh_run_refetches_everything() {
    let server = MockServer::start().await;
    mount_items(&server, 0..4, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, 0.0);
    write_input(&config, &locators(&server, 0..4));

    run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("First run failed");

    let options = HarvestOptions {
        fresh: true,
        stop: None,
    };
    let report = run_harvest(config.clone(), options)
        .await
        .expect("Fresh run failed");

    assert_eq!(report.attempted, 4);
    assert_eq!(request_count(&server).await, 8);
    assert_eq!(read_output(&config.paths.final_output).len(), 4);
}

#[tokio::test]
async fn test_same_host_dispatches_are_spaced() {
    let server = MockServer::start().await;
    mount_items(&server, 0..3, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3, 0.15);
    write_input(&config, &locators(&server, 0..3));

    let started = Instant::now();
    let report = run_harvest(config, HarvestOptions::default())
        .await
        .expect("Harvest failed");

    assert_eq!(report.extracted, 3);
    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "three dispatches to one host finished in {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_timeout_and_missing_metadata_are_skipped() {
    let server = MockServer::start().await;
    mount_items(&server, 0..2, &[]).await;

    Mock::given(method("GET"))
        .and(path("/slow/p"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page("Slow"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain/p"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>No data</body></html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), 4, 0.0);
    config.harvest.fetch_timeout_secs = 0.5;

    let mut input = locators(&server, 0..2);
    input.push(Locator::new("Slow", format!("{}/slow/p", server.uri())));
    input.push(Locator::new("Plain", format!("{}/plain/p", server.uri())));
    write_input(&config, &input);

    let report = run_harvest(config.clone(), HarvestOptions::default())
        .await
        .expect("Harvest failed");

    assert_eq!(report.extracted, 2);
    assert_eq!(report.outcome_count(ItemOutcome::Timeout), 1);
    assert_eq!(report.outcome_count(ItemOutcome::NoStructuredData), 1);
    assert_eq!(read_output(&config.paths.final_output).len(), 2);
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, 0.0);

    let result = run_harvest(config, HarvestOptions::default()).await;
    assert!(matches!(result, Err(HarvestError::Storage(_))));
}

#[tokio::test]
async fn test_corrupt_prior_checkpoint_is_fatal() {
    let server = MockServer::start().await;
    mount_items(&server, 0..2, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 4, 0.0);
    write_input(&config, &locators(&server, 0..2));
    std::fs::create_dir_all(dir.path().join("out")).unwrap();
    std::fs::write(&config.paths.partial, "[{not json").unwrap();

    let result = run_harvest(config, HarvestOptions::default()).await;

    assert!(matches!(result, Err(HarvestError::Storage(_))));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_plan_reports_pending_batches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 5, 0.0);

    let mut input = locators(&server, 0..12);
    input.push(input[0].clone());
    write_input(&config, &input);

    let plan = plan_harvest(&config, false).expect("Plan failed");

    assert_eq!(plan.locators_total, 13);
    assert_eq!(plan.duplicates, 1);
    assert_eq!(plan.pending, 12);
    assert_eq!(plan.batch_sizes, vec![5, 5, 2]);
    assert_eq!(request_count(&server).await, 0);
}
