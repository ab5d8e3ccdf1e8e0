//! Feed and order-flow latency models.
//!
//! Modeled and tested in isolation; not yet wired into the v1 event loop,
//! which fills orders synchronously at the candle that produced the
//! signal. This module exists as the injection point a future
//! event-driven loop will schedule orders through.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A reproducible delay distribution producing non-negative nanosecond
/// samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LatencyModel {
    Constant(u64),
    Normal { mean_ns: f64, std_ns: f64 },
    /// Monotonically increasing `(x, delay_ns)` control points; samples
    /// outside the table's range clamp to the nearest endpoint.
    Interpolated(Vec<(f64, u64)>),
}

impl LatencyModel {
    /// Draws one non-negative nanosecond delay from `rng`.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> u64 {
        match self {
            LatencyModel::Constant(ns) => *ns,
            LatencyModel::Normal { mean_ns, std_ns } => {
                let z = box_muller(rng);
                let sample = mean_ns + std_ns * z;
                sample.max(0.0).round() as u64
            }
            LatencyModel::Interpolated(table) => interpolate(table, rng.random::<f64>()),
        }
    }
}

/// Box–Muller transform producing one standard-normal sample from two
/// uniform draws. Negative results are the caller's responsibility to
/// clamp (delays are floored at zero above).
fn box_muller(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Picks the bounding control points for `x` and linearly blends their
/// delays. `table` must be sorted by `.0` ascending.
fn interpolate(table: &[(f64, u64)], x: f64) -> u64 {
    if table.is_empty() {
        return 0;
    }
    if x <= table[0].0 {
        return table[0].1;
    }
    let last = table.len() - 1;
    if x >= table[last].0 {
        return table[last].1;
    }

    for window in table.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x >= x0 && x <= x1 {
            if (x1 - x0).abs() < f64::EPSILON {
                return y0;
            }
            let t = (x - x0) / (x1 - x0);
            let blended = y0 as f64 + t * (y1 as f64 - y0 as f64);
            return blended.round() as u64;
        }
    }
    table[last].1
}

/// The full submit -> arrive -> process -> ack timeline for one order,
/// all timestamps in nanoseconds since the same epoch as `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTimeline {
    pub submit: u64,
    pub arrive: u64,
    pub process: u64,
    pub ack: u64,
}

impl OrderTimeline {
    pub fn round_trip_ns(&self) -> u64 {
        self.ack - self.submit
    }
}

/// Combines independent entry and response latency samples with a fixed
/// exchange processing time into a full [`OrderTimeline`].
pub struct OrderLatencyModel {
    pub entry: LatencyModel,
    pub response: LatencyModel,
    pub exchange_processing_ns: u64,
    entry_rng: ChaCha8Rng,
    response_rng: ChaCha8Rng,
}

impl OrderLatencyModel {
    /// `entry_seed` and `response_seed` must be distinct so the two
    /// channels never correlate.
    pub fn new(
        entry: LatencyModel,
        response: LatencyModel,
        exchange_processing_ns: u64,
        entry_seed: u64,
        response_seed: u64,
    ) -> Self {
        Self {
            entry,
            response,
            exchange_processing_ns,
            entry_rng: ChaCha8Rng::seed_from_u64(entry_seed),
            response_rng: ChaCha8Rng::seed_from_u64(response_seed),
        }
    }

    pub fn simulate_order_flow(&mut self, submit: u64) -> OrderTimeline {
        let arrive = submit + self.entry.sample(&mut self.entry_rng);
        let process = arrive + self.exchange_processing_ns;
        let ack = process + self.response.sample(&mut self.response_rng);
        OrderTimeline { submit, arrive, process, ack }
    }
}

/// Delays exchange-time events into strategy-visible local times. Unlike
/// [`OrderLatencyModel`], feed latency has a single channel: there is no
/// exchange round trip, only one-way propagation delay.
pub struct FeedLatencyModel {
    model: LatencyModel,
    rng: ChaCha8Rng,
}

impl FeedLatencyModel {
    pub fn new(model: LatencyModel, seed: u64) -> Self {
        Self { model, rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// The local (strategy-visible) time at which `exchange_time_ns`
    /// becomes observable.
    pub fn observe_at(&mut self, exchange_time_ns: u64) -> u64 {
        exchange_time_ns + self.model.sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_model_is_exact() {
        let model = LatencyModel::Constant(500);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(model.sample(&mut rng), 500);
        assert_eq!(model.sample(&mut rng), 500);
    }

    #[test]
    fn normal_model_is_never_negative() {
        let model = LatencyModel::Normal { mean_ns: 0.0, std_ns: 1000.0 };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let sample = model.sample(&mut rng);
            assert!(sample < u64::MAX);
        }
    }

    #[test]
    fn normal_model_is_deterministic_for_fixed_seed() {
        let model = LatencyModel::Normal { mean_ns: 100.0, std_ns: 20.0 };
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let seq_a: Vec<u64> = (0..10).map(|_| model.sample(&mut a)).collect();
        let seq_b: Vec<u64> = (0..10).map(|_| model.sample(&mut b)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn interpolated_model_clamps_at_endpoints() {
        let table = vec![(0.0, 100), (1.0, 200)];
        assert_eq!(interpolate(&table, -5.0), 100);
        assert_eq!(interpolate(&table, 5.0), 200);
        assert_eq!(interpolate(&table, 0.5), 150);
    }

    #[test]
    fn order_flow_composes_entry_processing_response() {
        let mut model = OrderLatencyModel::new(
            LatencyModel::Constant(100),
            LatencyModel::Constant(50),
            25,
            1,
            2,
        );
        let timeline = model.simulate_order_flow(1_000);
        assert_eq!(timeline.submit, 1_000);
        assert_eq!(timeline.arrive, 1_100);
        assert_eq!(timeline.process, 1_125);
        assert_eq!(timeline.ack, 1_175);
        assert_eq!(timeline.round_trip_ns(), 175);
    }

    #[test]
    fn entry_and_response_channels_are_independent() {
        // Same seed on both channels would correlate samples; distinct
        // seeds must not produce identical sequences for a non-constant model.
        let mut model = OrderLatencyModel::new(
            LatencyModel::Normal { mean_ns: 500.0, std_ns: 100.0 },
            LatencyModel::Normal { mean_ns: 500.0, std_ns: 100.0 },
            0,
            11,
            22,
        );
        let t1 = model.simulate_order_flow(0);
        let t2 = model.simulate_order_flow(1);
        assert_ne!(t1.arrive - t1.submit, t1.ack - t1.process);
        let _ = t2;
    }

    #[test]
    fn feed_latency_only_adds_forward() {
        let mut model = FeedLatencyModel::new(LatencyModel::Constant(10), 3);
        let observed = model.observe_at(1_000);
        assert_eq!(observed, 1_010);
    }
}
