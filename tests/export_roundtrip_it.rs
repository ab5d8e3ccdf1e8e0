mod common;

use std::io::{Read, Write};

use simbroker::{
    account::PositionSide, decimal::Decimal, export, BacktestConfig, BacktestResult,
    EquitySnapshot, JsonExportOptions, PerformanceMetrics, ResultMetadata, Trade,
};

fn sample_result() -> BacktestResult {
    BacktestResult {
        metadata: ResultMetadata { strategy_name: "sma-crossover".to_string(), generated_at_ms: 1_700_000_000_000 },
        config: BacktestConfig::new(
            "BTCUSD", "1m", 0, 3_600_000, Decimal::from_int(10_000), Decimal::ZERO, Decimal::ZERO, true, 1,
        )
        .unwrap(),
        metrics: PerformanceMetrics::default(),
        trades: vec![Trade {
            id: 1,
            side: PositionSide::Long,
            entry_time_ms: 0,
            exit_time_ms: 60_000,
            entry_price: Decimal::from_int(100),
            exit_price: Decimal::from_int(110),
            size: Decimal::ONE,
            pnl: Decimal::from_int(10),
            pnl_percent: 0.1,
            commission: Decimal::ZERO,
            duration_minutes: 1.0,
        }],
        equity_curve: vec![
            EquitySnapshot { timestamp_ms: 0, equity: Decimal::from_int(10_000), balance: Decimal::from_int(10_000), unrealized_pnl: Decimal::ZERO },
            EquitySnapshot { timestamp_ms: 60_000, equity: Decimal::from_int(10_010), balance: Decimal::from_int(10_010), unrealized_pnl: Decimal::ZERO },
        ],
    }
}

/// Writing a JSON export to disk and reading it back byte-for-byte must
/// reproduce the same document — exporters must not depend on any
/// process-local state (file handles, in-memory caches) to be faithful.
#[test]
fn json_export_survives_a_file_round_trip() {
    common::init_tracing();

    let result = sample_result();
    let json = export::to_json(&result, JsonExportOptions::full()).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();

    let mut reopened = std::fs::File::open(file.path()).unwrap();
    let mut read_back = String::new();
    reopened.read_to_string(&mut read_back).unwrap();

    assert_eq!(read_back, json);

    let parsed: serde_json::Value = serde_json::from_str(&read_back).unwrap();
    assert_eq!(parsed["metadata"]["strategy_name"], "sma-crossover");
    assert_eq!(parsed["trades"].as_array().unwrap().len(), 1);
    assert_eq!(parsed["equity_curve"].as_array().unwrap().len(), 2);
}

/// JSON export then import must yield a result record that compares equal
/// to the original, not just a byte-identical document.
#[test]
fn json_export_then_import_yields_an_equal_result() {
    let result = sample_result();
    let json = export::to_json(&result, JsonExportOptions::full()).unwrap();
    let parsed = export::from_json(&json).unwrap();
    assert_eq!(parsed, result);
}

/// CSV equity export then re-import must yield a bitwise-identical
/// equity series.
#[test]
fn equity_csv_export_then_import_yields_an_identical_series() {
    let result = sample_result();
    let csv = export::equity_to_csv(&result.equity_curve);
    let parsed = export::equity_from_csv(&csv).unwrap();
    assert_eq!(parsed, result.equity_curve);
}

/// Same property for trades: export then re-import must reproduce the
/// original trade vector exactly.
#[test]
fn trades_csv_export_then_import_yields_an_identical_series() {
    let result = sample_result();
    let csv = export::trades_to_csv(&result.trades);
    let parsed = export::trades_from_csv(&csv).unwrap();
    assert_eq!(parsed, result.trades);
}

/// Same property for the CSV equity export: round-tripping through a
/// temp file must not perturb a single row, since the CSV is the format
/// downstream spreadsheet tools re-import verbatim.
#[test]
fn equity_csv_survives_a_file_round_trip() {
    let result = sample_result();
    let csv = export::equity_to_csv(&result.equity_curve);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(csv.as_bytes()).unwrap();
    file.flush().unwrap();

    let mut reopened = std::fs::File::open(file.path()).unwrap();
    let mut read_back = String::new();
    reopened.read_to_string(&mut read_back).unwrap();

    assert_eq!(read_back, csv);
    assert_eq!(read_back.lines().count(), result.equity_curve.len() + 1);
}
