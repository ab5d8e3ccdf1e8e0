//! `simbroker`: a discrete-event historical market simulator for
//! algorithmic trading strategies. Given an ordered OHLCV candle stream
//! and a pluggable [`strategy::Strategy`], it reproduces the strategy's
//! decisions against a synthetic exchange modeling fills, commissions,
//! slippage, queue position, and dual-sided latency, emitting completed
//! trades and an equity curve from which risk/return metrics are derived.
//!
//! The core — decimal arithmetic, the event-loop state machine, the
//! order book, the latency model, the executor, and the account — is a
//! tightly coupled numerical and temporal engine where no look-ahead and
//! exact arithmetic are load-bearing invariants, not suggestions.

// === Public Modules (The Canonical Paths) ===
pub mod account;
pub mod analyzer;
pub mod book;
pub mod cache;
pub mod candle;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod executor;
pub mod export;
pub mod indicator;
pub mod latency;
pub mod optimizer;
pub mod strategy;

// === Facades (Re-exporting internals) ===
pub use account::{Account, EquitySnapshot, Position, PositionSide, Trade};
pub use analyzer::{analyze, PerformanceMetrics};
pub use candle::{Candle, CandleSeries, CandleView};
pub use config::BacktestConfig;
pub use decimal::Decimal;
pub use engine::{ChunkedCandleSource, Engine, EngineState};
pub use error::{SimBrokerError, SimBrokerResult};
pub use export::{
    equity_from_csv, equity_to_csv, from_json, to_json, trades_from_csv, trades_to_csv, BacktestResult,
    JsonExportOptions, ResultMetadata,
};
pub use strategy::{Signal, SignalKind, SignalSide, Strategy, StrategyContext, StrategyMetadata, StrategyParameter};
