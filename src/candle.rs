//! OHLCV candle and the owned series the engine runs over.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{decimal::Decimal, error::DataError};

/// A single OHLCV bar. `timestamp_ms` is Unix epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Magnitudes above this are assumed to be microseconds, not milliseconds.
const MICROSECOND_THRESHOLD: i64 = 1_000_000_000_000_000;

impl Candle {
    pub fn new(
        timestamp_ms: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        let timestamp_ms = if timestamp_ms.abs() > MICROSECOND_THRESHOLD {
            timestamp_ms / 1000
        } else {
            timestamp_ms
        };
        Self { timestamp_ms, open, high, low, close, volume }
    }

    fn validate(&self, index: usize) -> Result<(), DataError> {
        if self.volume.is_negative() {
            return Err(DataError::InvalidData {
                index,
                reason: "volume must be >= 0".to_string(),
            });
        }
        if self.low.cmp_to(self.open) == std::cmp::Ordering::Greater
            || self.low.cmp_to(self.close) == std::cmp::Ordering::Greater
        {
            return Err(DataError::InvalidData {
                index,
                reason: "low must be <= open and close".to_string(),
            });
        }
        if self.high.cmp_to(self.open) == std::cmp::Ordering::Less
            || self.high.cmp_to(self.close) == std::cmp::Ordering::Less
        {
            return Err(DataError::InvalidData {
                index,
                reason: "high must be >= open and close".to_string(),
            });
        }
        Ok(())
    }
}

/// An owned, validated sequence of candles for one pair/timeframe, plus
/// the indicator dictionary populated by a strategy's
/// `populate_indicators`.
///
/// Ownership: the engine owns this series for the duration of a run;
/// strategies receive a borrowed reference and may add indicator vectors
/// via [`CandleSeries::set_indicator`] but must not mutate candles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleSeries {
    pair: String,
    timeframe: String,
    candles: Vec<Candle>,
    indicators: HashMap<String, Vec<Decimal>>,
}

/// Minimum number of candles required to run a backtest.
pub const MIN_CANDLES: usize = 10;

impl CandleSeries {
    /// Validates monotonic timestamps and OHLC invariants.
    pub fn new(pair: impl Into<String>, timeframe: impl Into<String>, candles: Vec<Candle>) -> Result<Self, DataError> {
        if candles.is_empty() {
            return Err(DataError::NoData);
        }
        if candles.len() < MIN_CANDLES {
            return Err(DataError::InsufficientData {
                required: MIN_CANDLES,
                got: candles.len(),
            });
        }

        for (i, candle) in candles.iter().enumerate() {
            candle.validate(i)?;
            if i > 0 {
                let prev = candles[i - 1].timestamp_ms;
                if candle.timestamp_ms <= prev {
                    return Err(DataError::DataNotSorted {
                        index: i,
                        prev,
                        next: candle.timestamp_ms,
                    });
                }
            }
        }

        Ok(Self {
            pair: pair.into(),
            timeframe: timeframe.into(),
            candles,
            indicators: HashMap::new(),
        })
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Candles up to and including `index`. No look-ahead: callers must
    /// never be handed a slice that reaches past the current step.
    pub fn up_to(&self, index: usize) -> &[Candle] {
        &self.candles[..=index.min(self.candles.len().saturating_sub(1))]
    }

    /// A restricted view of this series for the event loop's current step.
    /// Everything a strategy reads during signal generation must go
    /// through this, never through `self` directly, so `index + k` candles
    /// and indicator values stay unreachable.
    pub fn view(&self, index: usize) -> CandleView<'_> {
        CandleView::new(self, index)
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    /// Installs (or overwrites) an indicator vector under `name`. Must be
    /// the same length as the candle series.
    pub fn set_indicator(&mut self, name: impl Into<String>, values: Vec<Decimal>) {
        self.indicators.insert(name.into(), values);
    }

    pub fn indicator(&self, name: &str) -> Option<&[Decimal]> {
        self.indicators.get(name).map(|v| v.as_slice())
    }

    pub fn indicator_at(&self, name: &str, index: usize) -> Option<Decimal> {
        self.indicators.get(name).and_then(|v| v.get(index)).copied()
    }

    pub fn indicator_names(&self) -> impl Iterator<Item = &str> {
        self.indicators.keys().map(|s| s.as_str())
    }
}

/// A read-only view over a [`CandleSeries`] restricted to `[0..=index]`.
/// This, not `&CandleSeries`, is what the event loop hands a strategy's
/// `generate_entry_signal`/`generate_exit_signal`: every accessor is
/// bounded by `index`, so a strategy has no way to read a candle or
/// indicator value that has not happened yet.
#[derive(Debug, Clone, Copy)]
pub struct CandleView<'a> {
    series: &'a CandleSeries,
    index: usize,
}

impl<'a> CandleView<'a> {
    pub(crate) fn new(series: &'a CandleSeries, index: usize) -> Self {
        Self { series, index }
    }

    pub fn pair(&self) -> &str {
        self.series.pair()
    }

    pub fn timeframe(&self) -> &str {
        self.series.timeframe()
    }

    /// The current step's index within the full series.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of candles visible so far, `index + 1`.
    pub fn len(&self) -> usize {
        self.index + 1
    }

    /// The candle driving this step.
    pub fn current(&self) -> &'a Candle {
        self.series.get(self.index).expect("index within series bounds")
    }

    /// `None` if `i` is past the current step.
    pub fn get(&self, i: usize) -> Option<&'a Candle> {
        if i > self.index {
            return None;
        }
        self.series.get(i)
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.series.up_to(self.index).iter().map(|c| c.close).collect()
    }

    /// `None` if `i` is past the current step or the indicator is unset at `i`.
    pub fn indicator_at(&self, name: &str, i: usize) -> Option<Decimal> {
        if i > self.index {
            return None;
        }
        self.series.indicator_at(name, i)
    }

    /// The indicator's values up to the current step, or `None` if the
    /// series has no indicator registered under `name`.
    pub fn indicator(&self, name: &str) -> Option<&'a [Decimal]> {
        self.series.indicator(name).map(|values| &values[..values.len().min(self.index + 1)])
    }
}
