//! Position, Account, and Trade bookkeeping.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    decimal::Decimal,
    error::{ExecutionError, StateError},
    executor::FillEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub entry_time_ms: i64,
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// `(close - entry_price) * size` for long, reversed for short.
    pub fn refresh_unrealized(&mut self, close: Decimal) {
        let diff = close - self.entry_price;
        self.unrealized_pnl = match self.side {
            PositionSide::Long => diff.checked_mul(self.size).expect("finite pnl"),
            PositionSide::Short => (-diff).checked_mul(self.size).expect("finite pnl"),
        };
    }
}

/// A completed round-trip. Immutable once emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub side: PositionSide,
    pub entry_time_ms: i64,
    pub exit_time_ms: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub size: Decimal,
    pub pnl: Decimal,
    pub pnl_percent: f64,
    pub commission: Decimal,
    pub duration_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub timestamp_ms: i64,
    pub equity: Decimal,
    pub balance: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Balance, equity, and cumulative commission for a single-position
/// account. `max_positions > 1` is reserved for a future version — this
/// type enforces at most one open position.
#[derive(Debug, Clone)]
pub struct Account {
    pub initial_capital: Decimal,
    pub balance: Decimal,
    pub equity: Decimal,
    pub total_commission: Decimal,
    position: Option<Position>,
    next_trade_id: u64,
}

impl Account {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            balance: initial_capital,
            equity: initial_capital,
            total_commission: Decimal::ZERO,
            position: None,
            next_trade_id: 1,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn has_open_position(&self) -> bool {
        self.position.is_some()
    }

    /// Debits `fill_price * size + commission` from balance and opens a
    /// position. Fails with [`StateError::PositionAlreadyExists`] if a
    /// position is already open, or [`ExecutionError::InsufficientFunds`]
    /// if the cost exceeds the current balance — the engine must log and
    /// skip the entry rather than partial-fill.
    #[tracing::instrument(skip(self, fill))]
    pub fn apply_entry_fill(&mut self, side: PositionSide, fill: &FillEvent) -> Result<(), crate::error::SimBrokerError> {
        if self.position.is_some() {
            return Err(StateError::PositionAlreadyExists.into());
        }

        let notional = fill.fill_price.checked_mul(fill.fill_size).expect("finite notional");
        let cost = notional.checked_add(fill.commission).expect("finite cost");
        if cost.cmp_to(self.balance) == std::cmp::Ordering::Greater {
            return Err(ExecutionError::InsufficientFunds {
                required: cost.to_string(),
                available: self.balance.to_string(),
            }
            .into());
        }

        self.balance = self.balance.checked_sub(cost).expect("balance covers cost");
        self.total_commission = self.total_commission.checked_add(fill.commission).expect("finite total");
        self.position = Some(Position {
            side,
            size: fill.fill_size,
            entry_price: fill.fill_price,
            entry_time_ms: fill.timestamp_ms,
            unrealized_pnl: Decimal::ZERO,
        });
        self.equity = self.balance;

        tracing::debug!(price = %fill.fill_price, size = %fill.fill_size, "position opened");
        Ok(())
    }

    /// Refreshes the open position's unrealized P&L against `close` and
    /// recomputes equity. No-op when flat.
    pub fn mark_to_market(&mut self, close: Decimal) {
        if let Some(position) = &mut self.position {
            position.refresh_unrealized(close);
            self.equity = self.balance.checked_add(position.unrealized_pnl).expect("finite equity");
        } else {
            self.equity = self.balance;
        }
    }

    pub fn snapshot(&self, timestamp_ms: i64) -> EquitySnapshot {
        EquitySnapshot {
            timestamp_ms,
            equity: self.equity,
            balance: self.balance,
            unrealized_pnl: self.position.map(|p| p.unrealized_pnl).unwrap_or(Decimal::ZERO),
        }
    }

    /// Closes the open position against `fill`, crediting proceeds plus
    /// realized P&L, and returns the completed [`Trade`]. Fails with
    /// [`StateError::NoPosition`] if flat.
    #[tracing::instrument(skip(self, fill))]
    pub fn apply_exit_fill(&mut self, fill: &FillEvent) -> Result<Trade, crate::error::SimBrokerError> {
        let position = self.position.take().ok_or(StateError::NoPosition)?;

        let diff = fill.fill_price - position.entry_price;
        let gross_pnl = match position.side {
            PositionSide::Long => diff.checked_mul(position.size).expect("finite pnl"),
            PositionSide::Short => (-diff).checked_mul(position.size).expect("finite pnl"),
        };
        let realized_pnl = gross_pnl.checked_sub(fill.commission).expect("finite realized pnl");

        let proceeds = fill.fill_price.checked_mul(position.size).expect("finite proceeds");
        self.balance = self
            .balance
            .checked_add(proceeds)
            .and_then(|b| b.checked_add(realized_pnl))
            .expect("finite balance");
        self.total_commission = self.total_commission.checked_add(fill.commission).expect("finite total");
        self.equity = self.balance;

        let cost_basis = position.entry_price.checked_mul(position.size).expect("finite cost basis");
        let pnl_percent = if cost_basis.is_zero() { 0.0 } else { realized_pnl.to_float() / cost_basis.to_float() };
        let duration_minutes =
            Duration::milliseconds(fill.timestamp_ms - position.entry_time_ms).num_seconds() as f64 / 60.0;

        let trade = Trade {
            id: self.next_trade_id,
            side: position.side,
            entry_time_ms: position.entry_time_ms,
            exit_time_ms: fill.timestamp_ms,
            entry_price: position.entry_price,
            exit_price: fill.fill_price,
            size: position.size,
            pnl: realized_pnl,
            pnl_percent,
            commission: fill.commission,
            duration_minutes,
        };
        self.next_trade_id += 1;

        tracing::debug!(pnl = %realized_pnl, pnl_percent, "position closed");
        Ok(trade)
    }
}
