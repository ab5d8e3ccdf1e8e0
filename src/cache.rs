//! Fingerprint -> indicator-vector cache, populated once per run and
//! read-only during the event loop.

use std::collections::HashMap;

use crate::{candle::CandleSeries, decimal::Decimal};

/// Identifies one indicator request: kernel name, its parameters, and the
/// series it was computed against. Used to build the cache fingerprint.
#[derive(Debug, Clone)]
pub struct IndicatorKey {
    pub name: String,
    pub params: String,
    pub pair: String,
    pub timeframe: String,
    pub data_endpoint_hash: String,
}

impl IndicatorKey {
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.name, self.params, self.pair, self.timeframe, self.data_endpoint_hash
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Owns indicator value buffers; consumers read by borrowed slice. Because
/// the cache is write-once per fingerprint before the event loop begins and
/// read-only during it, no lock is needed.
#[derive(Debug, Default)]
pub struct IndicatorCache {
    values: HashMap<String, Vec<Decimal>>,
    stats: CacheStats,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Checks the cache for `key`; on miss, invokes `compute`, inserts the
    /// result, and installs it into `series`'s indicator dictionary under
    /// `key.name` so the strategy can read it by name. Returns a borrowed
    /// slice into the cache's own buffer.
    pub fn get_or_compute<F>(
        &mut self,
        key: &IndicatorKey,
        series: &mut CandleSeries,
        compute: F,
    ) -> &[Decimal]
    where
        F: FnOnce() -> Vec<Decimal>,
    {
        let fingerprint = key.fingerprint();
        if self.values.contains_key(&fingerprint) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let computed = compute();
            series.set_indicator(key.name.clone(), computed.clone());
            self.values.insert(fingerprint.clone(), computed);
        }
        self.values.get(&fingerprint).expect("just inserted or already present")
    }

    /// Removes every cached entry whose fingerprint contains `substring`,
    /// used when a data source advances and stale indicator vectors must be
    /// recomputed.
    pub fn invalidate_matching(&mut self, substring: &str) {
        self.values.retain(|key, _| !key.contains(substring));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
