// Shared between the `sma_crossover` and `parameter_sweep` demos via
// `include!` — Cargo example targets are independent binaries and cannot
// `mod` each other directly.

struct SmaCrossover {
    fast_period: usize,
    slow_period: usize,
}

impl Strategy for SmaCrossover {
    fn populate_indicators(&mut self, series: &mut CandleSeries) -> Result<(), simbroker::error::StrategyError> {
        let closes = series.closes();
        series.set_indicator("sma_fast", simbroker::indicator::sma(&closes, self.fast_period));
        series.set_indicator("sma_slow", simbroker::indicator::sma(&closes, self.slow_period));
        Ok(())
    }

    fn generate_entry_signal(&mut self, series: &CandleView, index: usize) -> Option<Signal> {
        if index == 0 {
            return None;
        }
        let fast = series.indicator_at("sma_fast", index)?;
        let slow = series.indicator_at("sma_slow", index)?;
        let prev_fast = series.indicator_at("sma_fast", index - 1)?;
        let prev_slow = series.indicator_at("sma_slow", index - 1)?;
        if fast.is_nan() || slow.is_nan() || prev_fast.is_nan() || prev_slow.is_nan() {
            return None;
        }

        let crossed_up = prev_fast.cmp_to(prev_slow) != std::cmp::Ordering::Greater
            && fast.cmp_to(slow) == std::cmp::Ordering::Greater;
        if !crossed_up {
            return None;
        }

        let candle = series.get(index)?;
        Some(Signal {
            kind: SignalKind::EntryLong,
            pair: series.pair().to_string(),
            side: SignalSide::Buy,
            price: candle.close,
            strength: 1.0,
            timestamp_ms: candle.timestamp_ms,
            metadata: None,
        })
    }

    fn generate_exit_signal(&mut self, series: &CandleView, index: usize, _position: &Position) -> Option<Signal> {
        if index == 0 {
            return None;
        }
        let fast = series.indicator_at("sma_fast", index)?;
        let slow = series.indicator_at("sma_slow", index)?;
        let prev_fast = series.indicator_at("sma_fast", index - 1)?;
        let prev_slow = series.indicator_at("sma_slow", index - 1)?;
        if fast.is_nan() || slow.is_nan() || prev_fast.is_nan() || prev_slow.is_nan() {
            return None;
        }

        let crossed_down = prev_fast.cmp_to(prev_slow) != std::cmp::Ordering::Less
            && fast.cmp_to(slow) == std::cmp::Ordering::Less;
        if !crossed_down {
            return None;
        }

        let candle = series.get(index)?;
        Some(Signal {
            kind: SignalKind::ExitLong,
            pair: series.pair().to_string(),
            side: SignalSide::Sell,
            price: candle.close,
            strength: 1.0,
            timestamp_ms: candle.timestamp_ms,
            metadata: None,
        })
    }

    fn calculate_position_size(&mut self, signal: &Signal, account: &Account) -> Decimal {
        if signal.price.is_zero() {
            return Decimal::ZERO;
        }
        // Fixed fraction: commit a quarter of the balance per entry.
        account
            .balance
            .checked_mul(Decimal::from_str("0.25").unwrap())
            .and_then(|notional| notional.checked_div(signal.price))
            .unwrap_or(Decimal::ZERO)
    }

    fn get_metadata(&self) -> StrategyMetadata {
        StrategyMetadata {
            name: "sma-crossover".to_string(),
            version: "0.1.0".to_string(),
            author: "simbroker demos".to_string(),
            timeframe: "1m".to_string(),
            startup_candles: self.slow_period,
            minimal_roi: None,
            stoploss: None,
            trailing_stop: false,
        }
    }
}

/// A deterministic sine-plus-drift walk; good enough to exercise the
/// crossover without depending on an external data file.
fn synthetic_candles(n: usize) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64;
        let price = 100.0 + (t / 10.0).sin() * 5.0 + t * 0.05;
        candles.push(Candle::new(
            i as i64 * 60_000,
            Decimal::from_float(price),
            Decimal::from_float(price + 0.5),
            Decimal::from_float(price - 0.5),
            Decimal::from_float(price),
            Decimal::from_int(10),
        ));
    }
    candles
}
