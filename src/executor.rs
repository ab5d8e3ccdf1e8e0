//! Market order fill computation.

use serde::{Deserialize, Serialize};

use crate::{candle::Candle, decimal::Decimal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub id: u64,
    pub side: Side,
    pub size: Decimal,
}

/// A completed fill: the executor's only output. `timestamp_ms` is the
/// candle's timestamp — v1 fills at the candle that produced the signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: u64,
    pub timestamp_ms: i64,
    pub fill_price: Decimal,
    pub fill_size: Decimal,
    pub commission: Decimal,
}

/// Issues monotonic order ids and fills market orders at the current
/// candle's close, adjusted for slippage.
pub struct Executor {
    slippage: Decimal,
    commission_rate: Decimal,
    next_order_id: u64,
}

impl Executor {
    pub fn new(slippage: Decimal, commission_rate: Decimal) -> Self {
        Self { slippage, commission_rate, next_order_id: 1 }
    }

    pub fn next_order_id(&mut self) -> u64 {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    /// `base = current_candle.close`; buy fills at `base * (1 + slippage)`,
    /// sell fills at `base * (1 - slippage)`. Commission is always
    /// `fill_price * size * commission_rate`, charged on both entry and
    /// exit fills — the caller decides which leg this is.
    #[tracing::instrument(skip(self, current_candle), fields(order_id = order.id))]
    pub fn execute_market(&self, order: &Order, current_candle: &Candle) -> FillEvent {
        let base = current_candle.close;
        let slip_factor = match order.side {
            Side::Buy => Decimal::ONE + self.slippage,
            Side::Sell => Decimal::ONE - self.slippage,
        };
        let fill_price = base.checked_mul(slip_factor).expect("slippage factor is finite");
        let commission = fill_price
            .checked_mul(order.size)
            .and_then(|notional| notional.checked_mul(self.commission_rate))
            .expect("commission inputs are finite");

        tracing::debug!(%fill_price, %commission, "market order filled");

        FillEvent {
            order_id: order.id,
            timestamp_ms: current_candle.timestamp_ms,
            fill_price,
            fill_size: order.size,
            commission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle_with_close(close: f64) -> Candle {
        Candle::new(
            0,
            Decimal::from_float(close),
            Decimal::from_float(close),
            Decimal::from_float(close),
            Decimal::from_float(close),
            Decimal::ZERO,
        )
    }

    fn d(v: rust_decimal::Decimal) -> Decimal {
        Decimal::from_str(&v.to_string()).unwrap()
    }

    #[test]
    fn fixed_slippage_buy_matches_scenario_1() {
        let executor = Executor::new(d(dec!(0.0005)), d(dec!(0.001)));
        let candle = candle_with_close(2000.0);
        let order = Order { id: 1, side: Side::Buy, size: Decimal::ONE };
        let fill = executor.execute_market(&order, &candle);

        assert!((fill.fill_price.to_float() - 2001.0).abs() < 1e-9);
        assert!((fill.commission.to_float() - 2.001).abs() < 1e-9);
    }

    #[test]
    fn fixed_slippage_sell_matches_scenario_2() {
        let executor = Executor::new(d(dec!(0.0005)), d(dec!(0.001)));
        let candle = candle_with_close(2000.0);
        let order = Order { id: 1, side: Side::Sell, size: Decimal::ONE };
        let fill = executor.execute_market(&order, &candle);

        assert!((fill.fill_price.to_float() - 1999.0).abs() < 1e-9);
        assert!((fill.commission.to_float() - 1.999).abs() < 1e-9);
    }

    #[test]
    fn order_ids_are_monotonic() {
        let mut executor = Executor::new(Decimal::ZERO, Decimal::ZERO);
        let a = executor.next_order_id();
        let b = executor.next_order_id();
        assert_eq!(b, a + 1);
    }

    #[test]
    fn zero_cost_config_fills_at_exact_close() {
        let executor = Executor::new(Decimal::ZERO, Decimal::ZERO);
        let candle = candle_with_close(2000.0);
        let order = Order { id: 1, side: Side::Buy, size: Decimal::ONE };
        let fill = executor.execute_market(&order, &candle);
        assert_eq!(fill.fill_price.to_float(), 2000.0);
        assert!(fill.commission.is_zero());
    }
}
