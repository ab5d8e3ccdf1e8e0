//! The event-loop state machine and the chunked candle source.
//!
//! A struct owning the mutable run state, a small set of legal states, and
//! a per-step method that advances exactly one unit of simulated time.
//! Rather than materializing an explicit event queue, the loop drives a
//! strategy through a fixed five-step sequence per candle.

use strum_macros::Display;

use crate::{
    account::{Account, EquitySnapshot, PositionSide, Trade},
    candle::CandleSeries,
    config::BacktestConfig,
    error::{ExecutionError, SimBrokerError, StateError, StrategyError},
    executor::{Executor, Order, Side as ExecutorSide},
    strategy::{SignalKind, Strategy, StrategyContext},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EngineState {
    Initial,
    DataLoaded,
    IndicatorsReady,
    Running,
    Finalizing,
    Complete,
    Error,
}

impl EngineState {
    fn assert_transition(self, to: EngineState) -> Result<(), StateError> {
        use EngineState::*;
        let legal = matches!(
            (self, to),
            (Initial, DataLoaded)
                | (DataLoaded, IndicatorsReady)
                | (IndicatorsReady, Running)
                | (Running, Finalizing)
                | (Finalizing, Complete)
                | (_, Error)
        );
        if legal {
            Ok(())
        } else {
            Err(StateError::InvalidStateTransition { from: format!("{self:?}"), to: format!("{to:?}") })
        }
    }
}

/// Runs one backtest to completion. Single-threaded and deterministic:
/// within a run every computation depends only on prior candles.
pub struct Engine<S: Strategy> {
    state: EngineState,
    config: BacktestConfig,
    strategy: S,
    executor: Executor,
    account: Account,
    trades: Vec<Trade>,
    equity_curve: Vec<EquitySnapshot>,
}

impl<S: Strategy> Engine<S> {
    pub fn new(config: BacktestConfig, strategy: S) -> Self {
        let executor = Executor::new(config.slippage, config.commission_rate);
        let account = Account::new(config.initial_capital);
        Self {
            state: EngineState::Initial,
            config,
            strategy,
            executor,
            account,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    fn transition(&mut self, to: EngineState) -> Result<(), SimBrokerError> {
        self.state.assert_transition(to).map_err(|e| {
            self.state = EngineState::Error;
            e
        })?;
        self.state = to;
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Runs the full event loop over `series` and returns the accumulated
    /// trades and equity curve. `series` must already be validated — candle
    /// ingestion happens before the engine sees the data.
    #[tracing::instrument(skip(self, series), fields(pair = %series.pair()))]
    pub fn run(&mut self, mut series: CandleSeries) -> Result<(Vec<Trade>, Vec<EquitySnapshot>), SimBrokerError> {
        self.transition(EngineState::DataLoaded)?;
        tracing::info!(candles = series.len(), "candle stream loaded");

        let context = StrategyContext {
            run_id: format!("{}-{}-{}", self.config.pair, self.config.timeframe, self.config.start_time_ms),
            pair: self.config.pair.clone(),
            timeframe: self.config.timeframe.clone(),
        };
        self.strategy.init(&context).map_err(|e| {
            self.state = EngineState::Error;
            e
        })?;

        self.strategy
            .populate_indicators(&mut series)
            .map_err(|e| {
                self.state = EngineState::Error;
                e
            })?;
        self.transition(EngineState::IndicatorsReady)?;

        self.transition(EngineState::Running)?;
        let last_index = series.len() - 1;
        for index in 0..series.len() {
            self.step_candle(&series, index)?;
            if index > 0 && index % 1000 == 0 {
                tracing::info!(index, total = series.len(), "progress");
            }
        }

        self.transition(EngineState::Finalizing)?;
        self.force_close_if_open(&series, last_index)?;
        self.transition(EngineState::Complete)?;

        tracing::info!(trades = self.trades.len(), "run complete");
        Ok((std::mem::take(&mut self.trades), std::mem::take(&mut self.equity_curve)))
    }

    /// The five-step per-candle sub-state sequence. Exit has priority over
    /// entry within the same candle: an exit signal consumes the candle.
    fn step_candle(&mut self, series: &CandleSeries, index: usize) -> Result<(), SimBrokerError> {
        let candle = series.get(index).expect("index within series bounds");

        // 1. UPDATE_POSITION
        self.account.mark_to_market(candle.close);

        // 2. SNAPSHOT_EQUITY
        self.equity_curve.push(self.account.snapshot(candle.timestamp_ms));

        let view = series.view(index);

        // 3. CHECK_EXIT
        let mut exited = false;
        if let Some(position) = self.account.position().copied() {
            if let Some(signal) = self.strategy.generate_exit_signal(&view, index, &position) {
                self.execute_exit(candle, &signal)?;
                exited = true;
            }
        }

        // 4A. CHECK_ENTRY (skipped if this candle already consumed an exit)
        if !exited && !self.account.has_open_position() {
            if let Some(signal) = self.strategy.generate_entry_signal(&view, index) {
                self.execute_entry(candle, &signal);
            }
        }

        // 5. ADVANCE is implicit: the caller's loop moves to the next index.
        Ok(())
    }

    fn execute_entry(&mut self, candle: &crate::candle::Candle, signal: &crate::strategy::Signal) {
        let side = match signal.kind {
            SignalKind::EntryShort => PositionSide::Short,
            _ => PositionSide::Long,
        };
        if side == PositionSide::Short && !self.config.enable_short {
            tracing::warn!("short entry signal skipped: shorting disabled for this config");
            return;
        }

        let size = self.strategy.calculate_position_size(signal, &self.account);
        if !size.is_positive() {
            tracing::warn!("entry signal skipped: non-positive position size");
            return;
        }

        let order_id = self.executor.next_order_id();
        let executor_side = match side {
            PositionSide::Long => ExecutorSide::Buy,
            PositionSide::Short => ExecutorSide::Sell,
        };
        let order = Order { id: order_id, side: executor_side, size };
        let fill = self.executor.execute_market(&order, candle);

        match self.account.apply_entry_fill(side, &fill) {
            Ok(()) => {}
            Err(SimBrokerError::Execution(ExecutionError::InsufficientFunds { required, available })) => {
                tracing::warn!(required, available, "entry signal skipped: insufficient funds");
            }
            Err(other) => {
                tracing::warn!(error = %other, "entry signal skipped");
            }
        }
    }

    fn execute_exit(&mut self, candle: &crate::candle::Candle, signal: &crate::strategy::Signal) -> Result<(), StrategyError> {
        let position_side = self
            .account
            .position()
            .map(|p| p.side)
            .expect("exit signal implies an open position");

        let order_id = self.executor.next_order_id();
        let executor_side = match position_side {
            PositionSide::Long => ExecutorSide::Sell,
            PositionSide::Short => ExecutorSide::Buy,
        };
        let size = self.account.position().expect("checked above").size;
        let order = Order { id: order_id, side: executor_side, size };
        let fill = self.executor.execute_market(&order, candle);

        match self.account.apply_exit_fill(&fill) {
            Ok(trade) => self.trades.push(trade),
            Err(e) => tracing::warn!(error = %e, "exit signal could not be applied"),
        }
        let _ = signal;
        Ok(())
    }

    /// On the final candle, a residual open position is force-closed at
    /// that candle's close via a synthetic exit signal so every opened
    /// position yields a recorded Trade.
    fn force_close_if_open(&mut self, series: &CandleSeries, last_index: usize) -> Result<(), SimBrokerError> {
        if !self.account.has_open_position() {
            return Ok(());
        }
        tracing::warn!("forcing closure of residual open position at final candle");
        let candle = series.get(last_index).expect("series is non-empty");
        let position_side = self.account.position().expect("checked above").side;
        let synthetic = crate::strategy::Signal {
            kind: match position_side {
                PositionSide::Long => SignalKind::ExitLong,
                PositionSide::Short => SignalKind::ExitShort,
            },
            pair: series.pair().to_string(),
            side: match position_side {
                PositionSide::Long => crate::strategy::SignalSide::Sell,
                PositionSide::Short => crate::strategy::SignalSide::Buy,
            },
            price: candle.close,
            strength: 1.0,
            timestamp_ms: candle.timestamp_ms,
            metadata: Some("forced-closure".to_string()),
        };
        self.execute_exit(candle, &synthetic)?;
        Ok(())
    }
}

/// Streams candles from a backing sequence in fixed-size windows so a run
/// need not hold the entire file in memory at once. Each chunk is handed
/// to the caller as its own owned `Vec`; the caller is responsible for
/// recomputing indicator state per chunk.
///
/// Default overlap is `longest indicator warm-up period` the caller's
/// strategy declares via `startup_candles`, so the first `overlap` candles
/// of chunk N+1 duplicate the tail of chunk N and indicators begin
/// producing non-NaN values at the same relative offset every chunk.
pub struct ChunkedCandleSource<'a> {
    candles: &'a [crate::candle::Candle],
    chunk_size: usize,
    overlap: usize,
    cursor: usize,
}

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

impl<'a> ChunkedCandleSource<'a> {
    pub fn new(candles: &'a [crate::candle::Candle], chunk_size: usize, overlap: usize) -> Self {
        Self { candles, chunk_size: chunk_size.max(1), overlap, cursor: 0 }
    }
}

impl<'a> Iterator for ChunkedCandleSource<'a> {
    type Item = Vec<crate::candle::Candle>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.candles.len() {
            return None;
        }
        let start = self.cursor.saturating_sub(self.overlap);
        let end = (self.cursor + self.chunk_size).min(self.candles.len());
        let chunk = self.candles[start..end].to_vec();
        self.cursor = end;
        Some(chunk)
    }
}
