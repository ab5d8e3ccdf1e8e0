//! Sweeps the SMA-crossover strategy's fast/slow period axes in parallel
//! and prints the top-3 combinations by net profit.

use anyhow::{Context, Result};
use simbroker::{
    analyzer, decimal::Decimal, optimizer::{sweep, GridAxis}, Account, BacktestConfig, Candle,
    CandleSeries, CandleView, Engine, Position, Signal, SignalKind, SignalSide, Strategy, StrategyMetadata,
};

include!("sma_crossover_strategy.rs");

fn main() -> Result<()> {
    let axes = vec![
        GridAxis::new("fast_period", "5", "20", "5").context("bad fast_period axis")?,
        GridAxis::new("slow_period", "20", "60", "20").context("bad slow_period axis")?,
    ];

    let leaderboard = sweep(&axes, 3, |m| m.net_profit.to_float(), |params| {
        let fast_period = params.iter().find(|(n, _)| n == "fast_period").unwrap().1 as usize;
        let slow_period = params.iter().find(|(n, _)| n == "slow_period").unwrap().1 as usize;
        run_once(fast_period, slow_period)
    })
    .context("parameter sweep failed")?;

    println!("top combinations by net profit:");
    for entry in leaderboard.entries() {
        println!("  {:?} -> net_profit={}", entry.params, entry.metrics.net_profit);
    }

    Ok(())
}

fn run_once(fast_period: usize, slow_period: usize) -> Result<analyzer::PerformanceMetrics, simbroker::SimBrokerError> {
    let candles = synthetic_candles(500);
    let series = CandleSeries::new("BTCUSD", "1m", candles).expect("synthetic candles are always valid");

    let config = BacktestConfig::new(
        "BTCUSD",
        "1m",
        0,
        500 * 60_000,
        Decimal::from_int(10_000),
        Decimal::from_str("0.001").unwrap(),
        Decimal::from_str("0.0005").unwrap(),
        false,
        1,
    )
    .expect("config is static and valid");

    let strategy = SmaCrossover { fast_period, slow_period: slow_period.max(fast_period + 1) };
    let mut engine = Engine::new(config, strategy);
    let (trades, equity_curve) = engine.run(series)?;

    let trade_pnls: Vec<Decimal> = trades.iter().map(|t| t.pnl).collect();
    Ok(analyzer::analyze(&trade_pnls, &equity_curve, Decimal::from_int(10_000)))
}
