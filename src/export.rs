//! JSON and CSV result exporters. Hand-rolled rather than via a
//! DataFrame library — the result surface is a pair of plain slices
//! (`Trade`, `EquitySnapshot`), so a writer with no schema inference is
//! both simpler and matches the engine's in-memory value semantics.

use serde::{Deserialize, Serialize};

use crate::{
    account::{EquitySnapshot, PositionSide, Trade},
    analyzer::PerformanceMetrics,
    config::BacktestConfig,
    decimal::Decimal,
    error::DataError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub strategy_name: String,
    pub generated_at_ms: i64,
}

/// Owns everything an exporter needs: run metadata, config, metrics, and
/// the raw trade/equity buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub metadata: ResultMetadata,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquitySnapshot>,
}

/// Parses a string previously produced by [`to_json`] back into a
/// [`BacktestResult`]. Requires the `trades` and `equity_curve` sections to
/// be present, so it only round-trips JSON produced with
/// [`JsonExportOptions::full`].
pub fn from_json(json: &str) -> Result<BacktestResult, DataError> {
    serde_json::from_str(json).map_err(|e| DataError::ParseError(e.to_string()))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExportOptions {
    pub include_trades: bool,
    pub include_equity_curve: bool,
}

impl JsonExportOptions {
    pub fn full() -> Self {
        Self { include_trades: true, include_equity_curve: true }
    }
}

#[derive(Serialize)]
struct JsonExportView<'a> {
    metadata: &'a ResultMetadata,
    config: &'a BacktestConfig,
    metrics: &'a PerformanceMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    trades: Option<&'a [Trade]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    equity_curve: Option<&'a [EquitySnapshot]>,
}

/// Serializes `result` to a pretty JSON string with top-level sections for
/// metadata, config, metrics, trades, and equity_curve; the trade and
/// equity arrays may be omitted via `options`.
pub fn to_json(result: &BacktestResult, options: JsonExportOptions) -> Result<String, DataError> {
    let view = JsonExportView {
        metadata: &result.metadata,
        config: &result.config,
        metrics: &result.metrics,
        trades: options.include_trades.then_some(result.trades.as_slice()),
        equity_curve: options.include_equity_curve.then_some(result.equity_curve.as_slice()),
    };
    serde_json::to_string_pretty(&view).map_err(|e| DataError::ParseError(e.to_string()))
}

fn parse_decimal(s: &str) -> Result<Decimal, DataError> {
    Decimal::from_str(s).map_err(|e| DataError::ParseError(e.to_string()))
}

const TRADES_CSV_HEADER: &str =
    "id,entry_time,entry_price,exit_time,exit_price,size,side,pnl,pnl_percent,commission,duration_minutes";
const EQUITY_CSV_HEADER: &str = "timestamp,equity,balance,unrealized_pnl,drawdown";

pub fn trades_to_csv(trades: &[Trade]) -> String {
    let mut out = String::from(TRADES_CSV_HEADER);
    out.push('\n');
    for trade in trades {
        let side = match trade.side {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        };
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            trade.id,
            trade.entry_time_ms,
            trade.entry_price,
            trade.exit_time_ms,
            trade.exit_price,
            trade.size,
            side,
            trade.pnl,
            trade.pnl_percent,
            trade.commission,
            trade.duration_minutes,
        ));
    }
    out
}

/// Parses a string previously produced by [`trades_to_csv`] back into the
/// original [`Trade`] vector.
pub fn trades_from_csv(csv: &str) -> Result<Vec<Trade>, DataError> {
    let mut lines = csv.lines();
    let header = lines.next().ok_or_else(|| DataError::ParseError("empty trades CSV".to_string()))?;
    if header != TRADES_CSV_HEADER {
        return Err(DataError::ParseError(format!("unexpected trades CSV header: {header}")));
    }

    lines
        .filter(|line| !line.is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 11 {
                return Err(DataError::ParseError(format!("expected 11 trade CSV fields, got {}", fields.len())));
            }
            let parse_int = |s: &str| s.parse::<i64>().map_err(|_| DataError::ParseError(format!("bad integer: {s}")));
            let parse_float = |s: &str| s.parse::<f64>().map_err(|_| DataError::ParseError(format!("bad float: {s}")));
            let side = match fields[6] {
                "long" => PositionSide::Long,
                "short" => PositionSide::Short,
                other => return Err(DataError::ParseError(format!("unknown trade side: {other}"))),
            };
            Ok(Trade {
                id: fields[0].parse::<u64>().map_err(|_| DataError::ParseError(format!("bad id: {}", fields[0])))?,
                entry_time_ms: parse_int(fields[1])?,
                entry_price: parse_decimal(fields[2])?,
                exit_time_ms: parse_int(fields[3])?,
                exit_price: parse_decimal(fields[4])?,
                size: parse_decimal(fields[5])?,
                side,
                pnl: parse_decimal(fields[7])?,
                pnl_percent: parse_float(fields[8])?,
                commission: parse_decimal(fields[9])?,
                duration_minutes: parse_float(fields[10])?,
            })
        })
        .collect()
}

/// `drawdown` at row i is `(peak_so_far - equity_i) / peak_so_far`,
/// recomputed from the curve itself so the CSV is self-describing without
/// requiring the caller to pass [`PerformanceMetrics`]. `balance` and
/// `unrealized_pnl` are carried verbatim so [`equity_from_csv`] can
/// reconstruct the original snapshots exactly.
pub fn equity_to_csv(equity_curve: &[EquitySnapshot]) -> String {
    let mut out = String::from(EQUITY_CSV_HEADER);
    out.push('\n');

    let mut peak = f64::NEG_INFINITY;
    for snapshot in equity_curve {
        let equity = snapshot.equity.to_float();
        peak = peak.max(equity);
        let drawdown = if peak > 0.0 { (peak - equity) / peak } else { 0.0 };
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            snapshot.timestamp_ms, snapshot.equity, snapshot.balance, snapshot.unrealized_pnl, drawdown
        ));
    }
    out
}

/// Parses a string previously produced by [`equity_to_csv`] back into the
/// original [`EquitySnapshot`] vector. The `drawdown` column is derived
/// and ignored on import.
pub fn equity_from_csv(csv: &str) -> Result<Vec<EquitySnapshot>, DataError> {
    let mut lines = csv.lines();
    let header = lines.next().ok_or_else(|| DataError::ParseError("empty equity CSV".to_string()))?;
    if header != EQUITY_CSV_HEADER {
        return Err(DataError::ParseError(format!("unexpected equity CSV header: {header}")));
    }

    lines
        .filter(|line| !line.is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 5 {
                return Err(DataError::ParseError(format!("expected 5 equity CSV fields, got {}", fields.len())));
            }
            Ok(EquitySnapshot {
                timestamp_ms: fields[0].parse::<i64>().map_err(|_| DataError::ParseError(format!("bad timestamp: {}", fields[0])))?,
                equity: parse_decimal(fields[1])?,
                balance: parse_decimal(fields[2])?,
                unrealized_pnl: parse_decimal(fields[3])?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{account::PositionSide, decimal::Decimal};

    fn sample_trade() -> Trade {
        Trade {
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
        }
    }

    fn sample_snapshot(ts: i64, equity: f64) -> EquitySnapshot {
        EquitySnapshot {
            timestamp_ms: ts,
            equity: Decimal::from_float(equity),
            balance: Decimal::from_float(equity),
            unrealized_pnl: Decimal::ZERO,
        }
    }

    #[test]
    fn json_export_omits_arrays_when_disabled() {
        let result = BacktestResult {
            metadata: ResultMetadata { strategy_name: "test".to_string(), generated_at_ms: 0 },
            config: BacktestConfig::new(
                "BTCUSD", "1m", 0, 60_000, Decimal::from_int(1000), Decimal::ZERO, Decimal::ZERO, true, 1,
            )
            .unwrap(),
            metrics: PerformanceMetrics::default(),
            trades: vec![sample_trade()],
            equity_curve: vec![sample_snapshot(0, 1000.0)],
        };

        let json = to_json(&result, JsonExportOptions::default()).unwrap();
        assert!(!json.contains("\"trades\""));
        assert!(!json.contains("\"equity_curve\""));

        let full = to_json(&result, JsonExportOptions::full()).unwrap();
        assert!(full.contains("\"trades\""));
        assert!(full.contains("\"equity_curve\""));
    }

    #[test]
    fn trades_csv_has_expected_header_and_row_count() {
        let csv = trades_to_csv(&[sample_trade()]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), TRADES_CSV_HEADER);
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn equity_csv_drawdown_is_zero_at_new_peak() {
        let curve = vec![sample_snapshot(0, 1000.0), sample_snapshot(60_000, 1100.0)];
        let csv = equity_to_csv(&curve);
        let second_row = csv.lines().nth(2).unwrap();
        assert!(second_row.ends_with(",0"));
    }

    #[test]
    fn trades_csv_round_trips_exactly() {
        let trades = vec![sample_trade()];
        let csv = trades_to_csv(&trades);
        let parsed = trades_from_csv(&csv).unwrap();
        assert_eq!(parsed, trades);
    }

    #[test]
    fn equity_csv_round_trips_exactly() {
        let curve = vec![sample_snapshot(0, 1000.0), sample_snapshot(60_000, 1100.0)];
        let csv = equity_to_csv(&curve);
        let parsed = equity_from_csv(&csv).unwrap();
        assert_eq!(parsed, curve);
    }

    #[test]
    fn json_round_trips_exactly() {
        let result = BacktestResult {
            metadata: ResultMetadata { strategy_name: "test".to_string(), generated_at_ms: 0 },
            config: BacktestConfig::new(
                "BTCUSD", "1m", 0, 60_000, Decimal::from_int(1000), Decimal::ZERO, Decimal::ZERO, true, 1,
            )
            .unwrap(),
            metrics: PerformanceMetrics::default(),
            trades: vec![sample_trade()],
            equity_curve: vec![sample_snapshot(0, 1000.0)],
        };

        let json = to_json(&result, JsonExportOptions::full()).unwrap();
        let parsed = from_json(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
