mod common;

use simbroker::{analyze, decimal::Decimal, EquitySnapshot};

fn snapshot(ts: i64, equity: f64) -> EquitySnapshot {
    EquitySnapshot {
        timestamp_ms: ts,
        equity: Decimal::from_float(equity),
        balance: Decimal::from_float(equity),
        unrealized_pnl: Decimal::ZERO,
    }
}

#[test]
fn net_profit_equals_total_profit_minus_total_loss_exactly() {
    common::init_tracing();

    let pnls = vec![Decimal::from_int(120), Decimal::from_int(-40), Decimal::from_int(30)];
    let curve = vec![snapshot(0, 10_000.0), snapshot(60_000, 10_110.0)];
    let metrics = analyze(&pnls, &curve, Decimal::from_int(10_000));

    assert_eq!(metrics.total_profit, Decimal::from_int(150));
    assert_eq!(metrics.total_loss, Decimal::from_int(40));
    assert_eq!(metrics.net_profit, metrics.total_profit.checked_sub(metrics.total_loss).unwrap());
    assert_eq!(metrics.net_profit, Decimal::from_int(110));
}

#[test]
fn drawdown_stats_match_concrete_scenario() {
    let curve = vec![snapshot(0, 10_000.0), snapshot(60_000, 11_000.0), snapshot(120_000, 9_000.0), snapshot(180_000, 10_000.0)];
    let metrics = analyze(&[], &curve, Decimal::from_int(10_000));
    assert!((metrics.max_drawdown - 0.1818).abs() < 1e-3);
}

#[test]
fn win_plus_loss_never_exceeds_trade_count() {
    let pnls = vec![Decimal::from_int(10), Decimal::from_int(-5), Decimal::ZERO];
    let curve = vec![snapshot(0, 1000.0)];
    let metrics = analyze(&pnls, &curve, Decimal::from_int(1000));
    assert!((metrics.winning_count + metrics.losing_count) as usize <= pnls.len());
}
