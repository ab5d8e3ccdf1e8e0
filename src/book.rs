//! L3 queue-position order book.
//!
//! Estimates whether a resting limit order the strategy placed would have
//! been filled given only the public trade tape, without a real level-3
//! feed. Modeled and tested in isolation; not yet wired into the v1 event
//! loop, which only executes market orders.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

pub type OrderId = u64;

/// Discretized price bucket: the scaled `Decimal` compressed to an `i64` by
/// dividing out the 10^9 multiplier. The same price discipline is used on
/// both book sides so bid/ask keys remain comparable.
fn price_bucket(price: Decimal) -> i64 {
    (price.to_float() * 1_000_000_000.0).round() as i64
}

#[derive(Debug, Default)]
struct PriceLevel {
    orders: VecDeque<OrderId>,
    total_size: Decimal,
}

/// Established at insertion and updated as trades consume the front of the
/// level.
#[derive(Debug, Clone, Copy)]
pub struct QueuePositionRecord {
    pub position_in_queue: usize,
    pub total_size_ahead: Decimal,
    pub initial_size_ahead: Decimal,
    pub order_size: Decimal,
}

struct StoredOrder {
    side: Side,
    price_bucket: i64,
    remaining: Decimal,
    queue: QueuePositionRecord,
}

/// An L3 book tracking individual resting orders (not just aggregate
/// depth), split into two sides keyed by discretized price.
#[derive(Default)]
pub struct L3Book {
    bids: BTreeMap<i64, PriceLevel>,
    asks: BTreeMap<i64, PriceLevel>,
    storage: HashMap<OrderId, StoredOrder>,
    next_id: OrderId,
}

impl L3Book {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_map(&mut self, side: Side) -> &mut BTreeMap<i64, PriceLevel> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Computes `size_ahead` as the level's current resting total, appends
    /// the order to the level's FIFO, and returns a fresh id.
    pub fn add_order(&mut self, side: Side, price: Decimal, size: Decimal) -> OrderId {
        let bucket = price_bucket(price);
        let id = self.next_id;
        self.next_id += 1;

        let level = self.side_map(side).entry(bucket).or_default();
        let size_ahead = level.total_size;
        level.orders.push_back(id);
        level.total_size = level.total_size + size;

        let queue = QueuePositionRecord {
            position_in_queue: level.orders.len() - 1,
            total_size_ahead: size_ahead,
            initial_size_ahead: size_ahead,
            order_size: size,
        };

        self.storage.insert(id, StoredOrder { side, price_bucket: bucket, remaining: size, queue });
        id
    }

    /// Removes the order from its level's FIFO and from storage. No-op if
    /// the id is unknown (already filled or previously cancelled).
    pub fn cancel(&mut self, id: OrderId) {
        if let Some(order) = self.storage.remove(&id) {
            if let Some(level) = self.side_map(order.side).get_mut(&order.price_bucket) {
                level.total_size = level.total_size - order.remaining;
                level.orders.retain(|o| *o != id);
                if level.orders.is_empty() {
                    self.side_map(order.side).remove(&order.price_bucket);
                }
            }
        }
    }

    /// Consumes `size` against the opposite side's level starting from the
    /// front: the front order's `remaining` shrinks; when it hits zero it
    /// is evicted; the level's running total and each surviving order's
    /// `total_size_ahead` decrease accordingly.
    pub fn on_trade(&mut self, trade_side: Side, price: Decimal, size: Decimal) {
        let resting_side = trade_side.opposite();
        let bucket = price_bucket(price);
        let mut remaining_to_consume = size;

        let mut evicted = Vec::new();
        let order_ids: Vec<OrderId> = match self.side_map(resting_side).get(&bucket) {
            Some(level) => level.orders.iter().copied().collect(),
            None => return,
        };

        for id in order_ids {
            if remaining_to_consume.is_zero() {
                break;
            }
            let Some(order) = self.storage.get_mut(&id) else { continue };
            let consumed = order.remaining.min(remaining_to_consume);
            order.remaining = order.remaining - consumed;
            remaining_to_consume = remaining_to_consume - consumed;

            if let Some(level) = self.side_map(resting_side).get_mut(&bucket) {
                level.total_size = level.total_size - consumed;
                for other_id in level.orders.iter() {
                    if *other_id == id {
                        continue;
                    }
                    if let Some(other) = self.storage.get_mut(other_id) {
                        other.queue.total_size_ahead = other.queue.total_size_ahead - consumed;
                    }
                }
            }

            if order.remaining.is_zero() {
                evicted.push(id);
            }
        }

        for id in evicted {
            if let Some(order) = self.storage.remove(&id) {
                if let Some(level) = self.side_map(order.side).get_mut(&order.price_bucket) {
                    level.orders.retain(|o| *o != id);
                    if level.orders.is_empty() {
                        self.side_map(order.side).remove(&order.price_bucket);
                    }
                }
            }
        }
    }

    /// `true` iff `id` is on the opposite side of `trade_side` at the same
    /// discretized price and the queue model's probability at
    /// `x = total_size_ahead / initial_size_ahead` exceeds the deterministic
    /// fill threshold.
    pub fn check_my_order_fill(
        &self,
        id: OrderId,
        trade_price: Decimal,
        trade_side: Side,
        model: QueueModel,
    ) -> bool {
        let Some(order) = self.storage.get(&id) else { return false };
        if order.side != trade_side.opposite() {
            return false;
        }
        if order.price_bucket != price_bucket(trade_price) {
            return false;
        }

        let x = if order.queue.initial_size_ahead.is_zero() {
            0.0
        } else {
            (order.queue.total_size_ahead.checked_div(order.queue.initial_size_ahead))
                .map(|d| d.to_float())
                .unwrap_or(0.0)
        };

        if x == 0.0 {
            return true;
        }
        model.fill_probability(x) > 0.9
    }

    pub fn queue_position(&self, id: OrderId) -> Option<QueuePositionRecord> {
        self.storage.get(&id).map(|o| o.queue)
    }
}

/// Pure functions of normalized queue position `x in [0,1]` (0 = head of
/// the queue, 1 = tail) yielding a fill probability in `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum QueueModel {
    RiskAverse,
    Probability,
    PowerLaw,
    Logarithmic,
}

impl QueueModel {
    pub fn fill_probability(self, x: f64) -> f64 {
        match self {
            QueueModel::RiskAverse => if x < 0.01 { 1.0 } else { 0.0 },
            QueueModel::Probability => 1.0 - x,
            QueueModel::PowerLaw => 1.0 - x * x,
            QueueModel::Logarithmic => 1.0 - (1.0 + x).ln() / 2f64.ln(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: f64) -> Decimal {
        Decimal::from_float(v)
    }

    #[test]
    fn add_order_reports_size_ahead() {
        let mut book = L3Book::new();
        let a = book.add_order(Side::Bid, d(100.0), d(5.0));
        let b = book.add_order(Side::Bid, d(100.0), d(3.0));
        assert_eq!(book.queue_position(a).unwrap().initial_size_ahead, Decimal::ZERO);
        assert_eq!(book.queue_position(b).unwrap().initial_size_ahead, d(5.0));
    }

    #[test]
    fn cancel_removes_order_and_frees_level() {
        let mut book = L3Book::new();
        let a = book.add_order(Side::Ask, d(100.0), d(5.0));
        book.cancel(a);
        assert!(book.queue_position(a).is_none());
    }

    #[test]
    fn trade_consumes_front_of_queue_fifo() {
        let mut book = L3Book::new();
        let a = book.add_order(Side::Ask, d(100.0), d(5.0));
        let b = book.add_order(Side::Ask, d(100.0), d(3.0));

        // A buy trade at 100 consumes resting asks.
        book.on_trade(Side::Bid, d(100.0), d(5.0));

        // `a` (the front order) should be fully evicted.
        assert!(book.queue_position(a).is_none());
        // `b` should have its size_ahead reduced to 0 (it is now at the head).
        assert_eq!(book.queue_position(b).unwrap().total_size_ahead, Decimal::ZERO);
    }

    #[test]
    fn my_order_fills_only_on_opposite_side_same_price() {
        let mut book = L3Book::new();
        let a = book.add_order(Side::Ask, d(100.0), d(1.0));
        // A sell at the same price is on my own side -> never fills.
        assert!(!book.check_my_order_fill(a, d(100.0), Side::Ask, QueueModel::Probability));
        // A buy at a different price does not match.
        assert!(!book.check_my_order_fill(a, d(101.0), Side::Bid, QueueModel::Probability));
    }

    #[test]
    fn head_of_queue_fills_deterministically() {
        let mut book = L3Book::new();
        let a = book.add_order(Side::Ask, d(100.0), d(1.0));
        assert!(book.check_my_order_fill(a, d(100.0), Side::Bid, QueueModel::RiskAverse));
    }

    #[test]
    fn queue_model_probabilities_match_known_values_at_midpoint() {
        assert_eq!(QueueModel::RiskAverse.fill_probability(0.5), 0.0);
        assert_eq!(QueueModel::Probability.fill_probability(0.5), 0.5);
        assert_eq!(QueueModel::PowerLaw.fill_probability(0.5), 0.75);
        assert!((QueueModel::Logarithmic.fill_probability(0.5) - 0.415).abs() < 0.001);
    }
}
