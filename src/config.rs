//! Backtest configuration surface. The sole external configuration
//! surface; validation happens in the constructor.

use serde::{Deserialize, Serialize};

use crate::{decimal::Decimal, error::ConfigError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub pair: String,
    pub timeframe: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub initial_capital: Decimal,
    pub commission_rate: Decimal,
    pub slippage: Decimal,
    pub enable_short: bool,
    pub max_positions: u32,
}

impl BacktestConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pair: impl Into<String>,
        timeframe: impl Into<String>,
        start_time_ms: i64,
        end_time_ms: i64,
        initial_capital: Decimal,
        commission_rate: Decimal,
        slippage: Decimal,
        enable_short: bool,
        max_positions: u32,
    ) -> Result<Self, ConfigError> {
        if end_time_ms <= start_time_ms {
            return Err(ConfigError::InvalidTimeRange { start: start_time_ms, end: end_time_ms });
        }
        if !initial_capital.is_positive() {
            return Err(ConfigError::InvalidInitialCapital(initial_capital.to_string()));
        }
        if commission_rate.is_negative() || slippage.is_negative() {
            return Err(ConfigError::InvalidRates(format!(
                "commission_rate={commission_rate}, slippage={slippage}"
            )));
        }
        if max_positions < 1 {
            return Err(ConfigError::InvalidMaxPositions(max_positions));
        }

        Ok(Self {
            pair: pair.into(),
            timeframe: timeframe.into(),
            start_time_ms,
            end_time_ms,
            initial_capital,
            commission_rate,
            slippage,
            enable_short,
            max_positions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> (String, String, i64, i64, Decimal, Decimal, Decimal, bool, u32) {
        (
            "BTCUSD".to_string(),
            "1m".to_string(),
            0,
            60_000,
            Decimal::from_int(10_000),
            Decimal::ZERO,
            Decimal::ZERO,
            true,
            1,
        )
    }

    #[test]
    fn accepts_valid_config() {
        let (pair, tf, s, e, cap, comm, slip, short, max) = valid();
        assert!(BacktestConfig::new(pair, tf, s, e, cap, comm, slip, short, max).is_ok());
    }

    #[test]
    fn rejects_inverted_time_range() {
        let (pair, tf, _, _, cap, comm, slip, short, max) = valid();
        let err = BacktestConfig::new(pair, tf, 100, 0, cap, comm, slip, short, max).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeRange { .. }));
    }

    #[test]
    fn rejects_nonpositive_capital() {
        let (pair, tf, s, e, _, comm, slip, short, max) = valid();
        let err = BacktestConfig::new(pair, tf, s, e, Decimal::ZERO, comm, slip, short, max).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInitialCapital(_)));
    }

    #[test]
    fn rejects_negative_rates() {
        let (pair, tf, s, e, cap, _, slip, short, max) = valid();
        let err = BacktestConfig::new(pair, tf, s, e, cap, Decimal::from_int(-1), slip, short, max).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRates(_)));
    }

    #[test]
    fn rejects_zero_max_positions() {
        let (pair, tf, s, e, cap, comm, slip, short, _) = valid();
        let err = BacktestConfig::new(pair, tf, s, e, cap, comm, slip, short, 0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxPositions(0)));
    }
}
