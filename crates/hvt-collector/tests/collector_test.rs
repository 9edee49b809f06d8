//! End-to-end collection runs against canned API responses.
//!
//! A routing transport answers by URL substring so each test can make any
//! single endpoint fail while the others succeed.

use chrono::NaiveDate;
use hvt_collector::{AppConfig, AppError, Collector, ExistingRowPolicy};
use hvt_core::{FailurePolicy, Metric};
use hvt_fetch::{
    FetchError, FetchResult, HttpResponse, MarketDataClient, Request, ResilientFetcher, Sleeper,
    Transport,
};
use hvt_persistence::MergeOutcome;
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const HEADER: &str =
    "Date,HYPE_Volume_B,HYPE_Price,Binance_Volume_B,Coinbase_Volume_B,Upbit_Volume_B";

const PRICE_ROUTE: &str = "simple/price";
const INFO_ROUTE: &str = "/info";
const DERIVATIVES_ROUTE: &str = "derivatives/exchanges";
const LISTING_ROUTE: &str = "exchanges?per_page";

/// Answers each request with the first route whose key the URL contains.
struct RoutedTransport {
    routes: Vec<(&'static str, HttpResponse)>,
    calls: RefCell<Vec<String>>,
}

impl RoutedTransport {
    fn new(routes: Vec<(&'static str, HttpResponse)>) -> Self {
        Self {
            routes,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for &RoutedTransport {
    fn execute(&self, request: &Request) -> FetchResult<HttpResponse> {
        self.calls.borrow_mut().push(request.url().to_string());
        self.routes
            .iter()
            .find(|(key, _)| request.url().contains(key))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| FetchError::Transport(format!("no route for {}", request.url())))
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

fn ok(body: &str) -> HttpResponse {
    HttpResponse::new(200, body)
}

fn price_ok(btc_usd: &str) -> (&'static str, HttpResponse) {
    (PRICE_ROUTE, ok(&format!(r#"{{"bitcoin":{{"usd":{btc_usd}}}}}"#)))
}

fn info_ok(hype_px: &str) -> (&'static str, HttpResponse) {
    (
        INFO_ROUTE,
        ok(&format!(
            r#"[{{"universe":[{{"name":"BTC"}},{{"name":"HYPE"}}]}},[{{"markPx":"64000.0"}},{{"markPx":"{hype_px}"}}]]"#
        )),
    )
}

fn derivatives_ok(volume_btc: &str) -> (&'static str, HttpResponse) {
    (
        DERIVATIVES_ROUTE,
        ok(&format!(
            r#"{{"name":"Hyperliquid","trade_volume_24h_btc":"{volume_btc}"}}"#
        )),
    )
}

fn listing_ok(body: &str) -> (&'static str, HttpResponse) {
    (LISTING_ROUTE, ok(body))
}

const FULL_LISTING: &str = r#"[
    {"id":"binance","name":"Binance","trade_volume_24h_btc":250000.0},
    {"id":"gdax","name":"Coinbase Exchange","trade_volume_24h_btc":50000.0},
    {"id":"upbit","name":"Upbit","trade_volume_24h_btc":25000.0}
]"#;

/// All endpoints healthy: BTC at 50,000 USD.
fn healthy_routes() -> Vec<(&'static str, HttpResponse)> {
    vec![
        price_ok("50000"),
        info_ok("21.5"),
        derivatives_ok("100000"),
        listing_ok(FULL_LISTING),
    ]
}

fn config_for(path: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.output_path = path.to_string_lossy().into_owned();
    config.retry.max_attempts = 2;
    config.retry.base_delay_ms = 1;
    config
}

fn collector<'a>(
    config: &AppConfig,
    transport: &'a RoutedTransport,
) -> Collector<&'a RoutedTransport, NoSleep> {
    let fetcher = ResilientFetcher::new(transport, NoSleep, config.retry_policy());
    let client = MarketDataClient::with_fetcher(fetcher, config.endpoints());
    Collector::with_client(config, client).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_bootstrap_writes_header_and_one_row() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data").join("hype_volume.csv");
    let config = config_for(&path);

    let transport = RoutedTransport::new(healthy_routes());
    let report = collector(&config, &transport).run(day()).unwrap();

    assert_eq!(report.outcome, MergeOutcome::Inserted);
    assert!(report.persisted);

    // 100,000 BTC * 50,000 = 5B; 250,000 BTC -> 12.5B; 50,000 -> 2.5B; 25,000 -> 1.25B
    let lines = read_lines(&path);
    assert_eq!(lines, vec![
        HEADER.to_string(),
        "2025-06-15,5.00,21.5,12.50,2.50,1.25".to_string(),
    ]);
}

#[test]
fn test_calls_are_sequential_and_listing_fetched_once() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir.path().join("v.csv"));

    let transport = RoutedTransport::new(healthy_routes());
    collector(&config, &transport).run(day()).unwrap();

    let calls = transport.calls.borrow();
    assert_eq!(calls.len(), 4);
    assert!(calls[0].contains(PRICE_ROUTE));
    assert!(calls[1].contains(INFO_ROUTE));
    assert!(calls[2].contains(DERIVATIVES_ROUTE));
    assert!(calls[3].contains(LISTING_ROUTE));
}

#[test]
fn test_second_run_same_day_replaces_row() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let config = config_for(&path);

    let first = RoutedTransport::new(healthy_routes());
    collector(&config, &first).run(day()).unwrap();

    let second = RoutedTransport::new(vec![
        price_ok("60000"),
        info_ok("25.0"),
        derivatives_ok("100000"),
        listing_ok(FULL_LISTING),
    ]);
    let report = collector(&config, &second).run(day()).unwrap();
    assert_eq!(report.outcome, MergeOutcome::Replaced);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2, "exactly one data row for the date");
    assert_eq!(lines[1], "2025-06-15,6.00,25.0,15.00,3.00,1.50");
}

#[test]
fn test_rows_for_other_days_are_kept() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    fs::write(
        &path,
        format!("{HEADER}\n2025-06-14,4.80,20.1,12.00,2.40,1.20\n"),
    )
    .unwrap();
    let config = config_for(&path);

    let transport = RoutedTransport::new(healthy_routes());
    collector(&config, &transport).run(day()).unwrap();

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "2025-06-14,4.80,20.1,12.00,2.40,1.20");
    assert!(lines[2].starts_with("2025-06-15,"));
}

#[test]
fn test_one_comparator_failure_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let config = config_for(&path);

    // Coinbase (slot B) has a null volume
    let transport = RoutedTransport::new(vec![
        price_ok("50000"),
        info_ok("21.5"),
        derivatives_ok("100000"),
        listing_ok(
            r#"[
                {"id":"binance","trade_volume_24h_btc":250000.0},
                {"id":"gdax","trade_volume_24h_btc":null},
                {"id":"upbit","trade_volume_24h_btc":25000.0}
            ]"#,
        ),
    ]);
    let report = collector(&config, &transport).run(day()).unwrap();

    let metrics = report.metrics.unwrap();
    assert_eq!(metrics.comparator_volumes_b[0], Metric::Available(dec!(12.50)));
    assert!(!metrics.comparator_volumes_b[1].is_available());
    assert_eq!(metrics.comparator_volumes_b[2], Metric::Available(dec!(1.25)));

    assert_eq!(read_lines(&path)[1], "2025-06-15,5.00,21.5,12.50,0.00,1.25");
}

#[test]
fn test_missing_comparator_entry_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir.path().join("v.csv"));

    let transport = RoutedTransport::new(vec![
        price_ok("50000"),
        info_ok("21.5"),
        derivatives_ok("100000"),
        listing_ok(r#"[{"id":"binance","trade_volume_24h_btc":250000.0},{"id":"upbit","trade_volume_24h_btc":25000.0}]"#),
    ]);
    let row = collector(&config, &transport).run(day()).unwrap().row.unwrap();

    assert_eq!(row.comparator_volumes_b, [dec!(12.50), dec!(0), dec!(1.25)]);
}

#[test]
fn test_oversized_volume_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let config = config_for(&path);

    let transport = RoutedTransport::new(vec![
        price_ok("50000"),
        info_ok("21.5"),
        derivatives_ok("100000"),
        listing_ok(
            r#"[
                {"id":"binance","trade_volume_24h_btc":1e28},
                {"id":"gdax","trade_volume_24h_btc":50000.0},
                {"id":"upbit","trade_volume_24h_btc":25000.0}
            ]"#,
        ),
    ]);
    let report = collector(&config, &transport).run(day()).unwrap();

    let metrics = report.metrics.unwrap();
    match &metrics.comparator_volumes_b[0] {
        Metric::Unavailable(reason) => assert!(reason.contains("volume conversion overflow")),
        other => panic!("Expected unavailable Binance volume, got {other:?}"),
    }
    assert!(report.persisted);
    assert_eq!(read_lines(&path)[1], "2025-06-15,5.00,21.5,0.00,2.50,1.25");
}

#[test]
fn test_reference_price_failure_zeroes_volumes_but_writes_row() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let config = config_for(&path);

    let transport = RoutedTransport::new(vec![
        (PRICE_ROUTE, HttpResponse::new(429, "")),
        info_ok("21.5"),
        derivatives_ok("100000"),
        listing_ok(FULL_LISTING),
    ]);
    let report = collector(&config, &transport).run(day()).unwrap();

    let row = report.row.unwrap();
    assert_eq!(row.date, day());
    assert!(row.target_volume_b.is_zero());
    assert!(row.comparator_volumes_b.iter().all(|v| v.is_zero()));
    assert_eq!(row.target_price, dec!(21.5));

    // Volume endpoints are not queried without a price to convert with
    let calls = transport.calls.borrow();
    assert_eq!(calls.iter().filter(|u| u.contains(PRICE_ROUTE)).count(), 2);
    assert!(!calls.iter().any(|u| u.contains(LISTING_ROUTE)));

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "2025-06-15,0.00,21.5,0.00,0.00,0.00");
}

#[test]
fn test_total_failure_still_writes_dated_row() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let config = config_for(&path);

    let transport = RoutedTransport::new(Vec::new());
    let report = collector(&config, &transport).run(day()).unwrap();

    assert!(report.persisted);
    assert_eq!(read_lines(&path)[1], "2025-06-15,0.00,0,0.00,0.00,0.00");
}

#[test]
fn test_listing_failure_affects_only_comparators() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir.path().join("v.csv"));

    let transport = RoutedTransport::new(vec![
        price_ok("50000"),
        info_ok("21.5"),
        derivatives_ok("100000"),
        (LISTING_ROUTE, HttpResponse::new(503, "upstream down")),
    ]);
    let row = collector(&config, &transport).run(day()).unwrap().row.unwrap();

    assert_eq!(row.target_volume_b, dec!(5.00));
    assert!(row.comparator_volumes_b.iter().all(|v| v.is_zero()));
}

#[test]
fn test_universe_context_mismatch_makes_price_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir.path().join("v.csv"));

    let transport = RoutedTransport::new(vec![
        price_ok("50000"),
        (
            INFO_ROUTE,
            ok(r#"[{"universe":[{"name":"BTC"},{"name":"HYPE"}]},[{"markPx":"64000.0"}]]"#),
        ),
        derivatives_ok("100000"),
        listing_ok(FULL_LISTING),
    ]);
    let report = collector(&config, &transport).run(day()).unwrap();

    let metrics = report.metrics.unwrap();
    match &metrics.target_price {
        Metric::Unavailable(reason) => assert!(reason.contains("asset contexts")),
        other => panic!("Expected unavailable target price, got {other:?}"),
    }
    assert!(report.row.unwrap().target_price.is_zero());
}

#[test]
fn test_strict_policy_aborts_and_leaves_table_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let existing = format!("{HEADER}\n2025-06-14,4.80,20.1,12.00,2.40,1.20\n");
    fs::write(&path, &existing).unwrap();

    let mut config = config_for(&path);
    config.failure_policy = FailurePolicy::Strict;

    let transport = RoutedTransport::new(vec![
        price_ok("50000"),
        info_ok("21.5"),
        derivatives_ok("100000"),
        listing_ok(r#"[{"id":"binance","trade_volume_24h_btc":250000.0}]"#),
    ]);
    let err = collector(&config, &transport).run(day()).unwrap_err();

    assert!(matches!(err, AppError::Incomplete(_)));
    assert!(err.to_string().contains("Coinbase"));
    assert_eq!(fs::read_to_string(&path).unwrap(), existing);
}

#[test]
fn test_skip_policy_leaves_existing_row_and_fetches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let existing = format!("{HEADER}\n2025-06-15,4.80,20.1,12.00,2.40,1.20\n");
    fs::write(&path, &existing).unwrap();

    let mut config = config_for(&path);
    config.existing_row = ExistingRowPolicy::Skip;

    let transport = RoutedTransport::new(healthy_routes());
    let report = collector(&config, &transport).run(day()).unwrap();

    assert_eq!(report.outcome, MergeOutcome::Skipped);
    assert!(report.row.is_none());
    assert!(transport.calls.borrow().is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), existing);
}

#[test]
fn test_dry_run_does_not_create_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    let mut config = config_for(&path);
    config.dry_run = true;

    let transport = RoutedTransport::new(healthy_routes());
    let report = collector(&config, &transport).run(day()).unwrap();

    assert!(!report.persisted);
    assert_eq!(report.row.unwrap().target_volume_b, dec!(5.00));
    assert!(!path.exists());
}

#[test]
fn test_header_mismatch_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.csv");
    fs::write(&path, "Date,Volume\n").unwrap();
    let config = config_for(&path);

    let transport = RoutedTransport::new(healthy_routes());
    let err = collector(&config, &transport).run(day()).unwrap_err();

    assert!(matches!(err, AppError::Persistence(_)));
    assert!(transport.calls.borrow().is_empty());
}
