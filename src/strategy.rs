//! Strategy capability set consumed by the engine.
//!
//! A small object-safe trait with sensible defaults, blanket-implemented
//! for `Box<dyn Strategy>` so the engine can hold one without knowing its
//! concrete type.

use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, Position},
    candle::{CandleSeries, CandleView},
    decimal::Decimal,
    error::StrategyError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    EntryLong,
    EntryShort,
    ExitLong,
    ExitShort,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalSide {
    Buy,
    Sell,
}

/// Produced by the strategy, consumed exactly once by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub pair: String,
    pub side: SignalSide,
    pub price: Decimal,
    /// Confidence in [0,1]; the engine does not interpret this, strategies
    /// may use it for position sizing.
    pub strength: f64,
    pub timestamp_ms: i64,
    pub metadata: Option<String>,
}

/// One axis of a strategy's tunable parameters. The closed, exhaustive set
/// of variants is a sum type rather than open polymorphism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StrategyParameter {
    Integer { name: String, min: i64, max: i64, step: i64 },
    Decimal { name: String, min: f64, max: f64, step: f64 },
    Boolean { name: String },
    Discrete { name: String, choices: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub name: String,
    pub version: String,
    pub author: String,
    pub timeframe: String,
    /// Minimum number of leading candles required before signals are valid
    /// (warm-up for the strategy's own indicators).
    pub startup_candles: usize,
    pub minimal_roi: Option<f64>,
    pub stoploss: Option<f64>,
    pub trailing_stop: bool,
}

/// The read-only run identity a strategy may log against. No exchange
/// handle is exposed during backtest; strategies only see candle data.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub run_id: String,
    pub pair: String,
    pub timeframe: String,
}

pub trait Strategy {
    fn init(&mut self, context: &StrategyContext) -> Result<(), StrategyError> {
        let _ = context;
        Ok(())
    }

    /// Fills `series`'s indicator dictionary. Called once, before the
    /// event loop enters RUNNING.
    fn populate_indicators(&mut self, series: &mut CandleSeries) -> Result<(), StrategyError>;

    /// `series` is restricted to `[0..=index]`; there is no way to read a
    /// candle or indicator value past the current step.
    fn generate_entry_signal(&mut self, series: &CandleView, index: usize) -> Option<Signal>;

    fn generate_exit_signal(&mut self, series: &CandleView, index: usize, position: &Position) -> Option<Signal>;

    /// Defaults to the account's full balance divided by the signal price
    /// — most strategies override this with a fixed fraction or fixed
    /// unit size.
    fn calculate_position_size(&mut self, signal: &Signal, account: &Account) -> Decimal {
        if signal.price.is_zero() {
            return Decimal::ZERO;
        }
        account.balance.checked_div(signal.price).unwrap_or(Decimal::ZERO)
    }

    fn get_metadata(&self) -> StrategyMetadata;

    fn get_parameters(&self) -> Vec<StrategyParameter> {
        Vec::new()
    }
}

impl Strategy for Box<dyn Strategy + Send> {
    fn init(&mut self, context: &StrategyContext) -> Result<(), StrategyError> {
        (**self).init(context)
    }

    fn populate_indicators(&mut self, series: &mut CandleSeries) -> Result<(), StrategyError> {
        (**self).populate_indicators(series)
    }

    fn generate_entry_signal(&mut self, series: &CandleView, index: usize) -> Option<Signal> {
        (**self).generate_entry_signal(series, index)
    }

    fn generate_exit_signal(&mut self, series: &CandleView, index: usize, position: &Position) -> Option<Signal> {
        (**self).generate_exit_signal(series, index, position)
    }

    fn calculate_position_size(&mut self, signal: &Signal, account: &Account) -> Decimal {
        (**self).calculate_position_size(signal, account)
    }

    fn get_metadata(&self) -> StrategyMetadata {
        (**self).get_metadata()
    }

    fn get_parameters(&self) -> Vec<StrategyParameter> {
        (**self).get_parameters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::Candle;

    struct AlwaysHold;

    impl Strategy for AlwaysHold {
        fn populate_indicators(&mut self, _series: &mut CandleSeries) -> Result<(), StrategyError> {
            Ok(())
        }
        fn generate_entry_signal(&mut self, _series: &CandleView, _index: usize) -> Option<Signal> {
            None
        }
        fn generate_exit_signal(&mut self, _series: &CandleView, _index: usize, _position: &Position) -> Option<Signal> {
            None
        }
        fn get_metadata(&self) -> StrategyMetadata {
            StrategyMetadata {
                name: "always-hold".to_string(),
                version: "0.1.0".to_string(),
                author: "test".to_string(),
                timeframe: "1m".to_string(),
                startup_candles: 0,
                minimal_roi: None,
                stoploss: None,
                trailing_stop: false,
            }
        }
    }

    #[test]
    fn default_position_size_divides_balance_by_price() {
        let account = Account::new(Decimal::from_int(1000));
        let mut strategy = AlwaysHold;
        let signal = Signal {
            kind: SignalKind::EntryLong,
            pair: "BTCUSD".to_string(),
            side: SignalSide::Buy,
            price: Decimal::from_int(100),
            strength: 1.0,
            timestamp_ms: 0,
            metadata: None,
        };
        let size = strategy.calculate_position_size(&signal, &account);
        assert_eq!(size.to_float(), 10.0);
    }

    #[test]
    fn boxed_strategy_forwards_through_trait_object() {
        let candles: Vec<Candle> = (0..12)
            .map(|i| {
                Candle::new(
                    i * 60_000,
                    Decimal::from_int(100),
                    Decimal::from_int(101),
                    Decimal::from_int(99),
                    Decimal::from_int(100),
                    Decimal::from_int(10),
                )
            })
            .collect();
        let mut series = CandleSeries::new("BTCUSD", "1m", candles).unwrap();
        let mut boxed: Box<dyn Strategy + Send> = Box::new(AlwaysHold);
        boxed.populate_indicators(&mut series).unwrap();
        assert!(boxed.generate_entry_signal(&series.view(5), 5).is_none());
        assert_eq!(boxed.get_metadata().name, "always-hold");
    }
}
