//! Runs a simple SMA-crossover strategy against a synthetic candle stream
//! and prints the resulting trades and headline metrics.

use anyhow::{Context, Result};
use simbroker::{
    decimal::Decimal, Account, BacktestConfig, Candle, CandleSeries, CandleView, Engine, EngineState,
    Position, Signal, SignalKind, SignalSide, Strategy, StrategyMetadata,
};

include!("sma_crossover_strategy.rs");

fn main() -> Result<()> {
    let candles = synthetic_candles(500);
    let series = CandleSeries::new("BTCUSD", "1m", candles).context("failed to build candle series")?;

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
    .context("invalid backtest config")?;

    let strategy = SmaCrossover { fast_period: 10, slow_period: 30 };
    let mut engine = Engine::new(config, strategy);
    let (trades, equity_curve) = engine.run(series).context("backtest run failed")?;

    assert_eq!(engine.state(), EngineState::Complete);
    println!("trades executed: {}", trades.len());
    for trade in &trades {
        println!(
            "  #{} {:?} entry={} exit={} pnl={}",
            trade.id, trade.side, trade.entry_price, trade.exit_price, trade.pnl
        );
    }
    if let Some(last) = equity_curve.last() {
        println!("final equity: {}", last.equity);
    }

    Ok(())
}
