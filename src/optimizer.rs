//! Cartesian parameter-sweep driver that re-runs the engine once per
//! parameter combination. Parallelism lives only here; each individual
//! backtest stays single-threaded and deterministic.

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    analyzer::{self, PerformanceMetrics},
    decimal::Decimal,
    error::{DataError, SimBrokerError},
};

/// One axis of a parameter sweep. Bounds are parsed from strings so
/// `"0.1"` never becomes an ambiguous binary float before the sweep
/// enumerates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridAxis {
    name: String,
    start: f64,
    end: f64,
    step: f64,
    precision: u32,
}

impl GridAxis {
    pub fn new(name: impl Into<String>, start: &str, end: &str, step: &str) -> Result<Self, DataError> {
        let start_f: f64 = start.parse().map_err(|_| DataError::ParseError(start.to_string()))?;
        let end_f: f64 = end.parse().map_err(|_| DataError::ParseError(end.to_string()))?;
        let step_f: f64 = step.parse().map_err(|_| DataError::ParseError(step.to_string()))?;
        if step_f <= 0.0 {
            return Err(DataError::ParseError(format!("step must be positive, got {step}")));
        }

        let precision = step.split('.').nth(1).map(|s| s.len() as u32).unwrap_or(0);
        Ok(Self { name: name.into(), start: start_f, end: end_f, step: step_f, precision })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Half-open `[start, end)` enumeration, rounded to the step's implied
    /// decimal precision to avoid binary-float drift accumulating across
    /// the range.
    pub fn generate(&self) -> Vec<f64> {
        let factor = 10f64.powi(self.precision as i32);
        let mut values = Vec::new();
        let mut v = self.start;
        let mut i = 0u64;
        while v < self.end {
            values.push((v * factor).round() / factor);
            i += 1;
            v = self.start + self.step * i as f64;
        }
        values
    }
}

/// Named values for one run of the cartesian product.
pub type ParameterSet = Vec<(String, f64)>;

/// Builds the full cartesian product of every axis's generated values via
/// `itertools::multi_cartesian_product`, which handles a runtime-variable
/// number of axes (unlike the `iproduct!` macro, which needs a fixed arity
/// known at compile time).
pub fn cartesian_product(axes: &[GridAxis]) -> Vec<ParameterSet> {
    if axes.is_empty() {
        return Vec::new();
    }
    axes.iter()
        .map(|axis| axis.generate().into_iter().map(|v| (axis.name().to_string(), v)))
        .multi_cartesian_product()
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub params: ParameterSet,
    pub metrics: PerformanceMetrics,
}

/// Ranks a sweep result by `key_metric` descending, keeping only the top
/// `top_k` entries.
pub struct Leaderboard {
    top_k: usize,
    entries: Vec<SweepEntry>,
}

impl Leaderboard {
    pub fn new(top_k: usize) -> Self {
        Self { top_k, entries: Vec::new() }
    }

    pub fn update(&mut self, entry: SweepEntry, key_metric: impl Fn(&PerformanceMetrics) -> f64) {
        self.entries.push(entry);
        self.entries.sort_by(|a, b| key_metric(&b.metrics).total_cmp(&key_metric(&a.metrics)));
        self.entries.truncate(self.top_k);
    }

    pub fn merge(mut self, other: Leaderboard, key_metric: impl Fn(&PerformanceMetrics) -> f64) -> Self {
        self.entries.extend(other.entries);
        self.entries.sort_by(|a, b| key_metric(&b.metrics).total_cmp(&key_metric(&a.metrics)));
        self.entries.truncate(self.top_k);
        self
    }

    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }
}

/// Runs `run_one` once per cartesian combination of `axes` in parallel via
/// `rayon`, collecting a ranked leaderboard keyed by `key_metric`. Engines
/// share no mutable state across workers, only read-only candle data.
pub fn sweep<F>(
    axes: &[GridAxis],
    top_k: usize,
    key_metric: impl Fn(&PerformanceMetrics) -> f64 + Sync,
    run_one: F,
) -> Result<Leaderboard, SimBrokerError>
where
    F: Fn(&ParameterSet) -> Result<PerformanceMetrics, SimBrokerError> + Sync,
{
    let combinations = cartesian_product(axes);
    let pb = progress_bar(combinations.len() as u64);
    pb.set_message("running parameter sweep...");

    let leaderboard = combinations
        .par_iter()
        .try_fold(
            || Leaderboard::new(top_k),
            |mut board, params| -> Result<Leaderboard, SimBrokerError> {
                let metrics = run_one(params)?;
                board.update(SweepEntry { params: params.clone(), metrics }, &key_metric);
                pb.inc(1);
                Ok(board)
            },
        )
        .try_reduce(
            || Leaderboard::new(top_k),
            |a, b| Ok(a.merge(b, &key_metric)),
        )?;

    pb.finish_with_message("sweep complete");
    Ok(leaderboard)
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta_precise}) {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}
