//! Synthetic bar generator used for demos and tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::kline_unit::KLineUnit;
use crate::common::time::MS_PER_DAY;

/// Close-to-close move is `(u - 0.5) * VOLATILITY * price` for uniform `u`
const VOLATILITY: f64 = 0.02;
/// High/low extend the candle body by up to this fraction of price
const WICK_RATIO: f64 = 0.01;
const MIN_VOLUME: u64 = 100_000;
const MAX_VOLUME: u64 = 1_100_000;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    pub start_ts: i64,
    pub step_ms: i64,
    pub start_price: f64,
    pub seed: u64,
}

impl SampleConfig {
    /// `count` daily bars ending one step before `now_ms`
    pub fn daily_until(now_ms: i64, count: usize, seed: u64) -> Self {
        Self {
            count,
            start_ts: now_ms - count as i64 * MS_PER_DAY,
            step_ms: MS_PER_DAY,
            start_price: 100.0,
            seed,
        }
    }
}

/// Seeded random walk: every bar opens at the previous close.
pub fn generate_sample_bars(conf: &SampleConfig) -> Vec<KLineUnit> {
    let mut rng = ChaCha8Rng::seed_from_u64(conf.seed);
    let mut bars = Vec::with_capacity(conf.count);
    let mut price = conf.start_price;
    let mut timestamp = conf.start_ts;

    for _ in 0..conf.count {
        let open = price;
        let change = (rng.gen::<f64>() - 0.5) * VOLATILITY * price;
        let close = open + change;
        let high = open.max(close) + rng.gen::<f64>() * WICK_RATIO * price;
        let low = open.min(close) - rng.gen::<f64>() * WICK_RATIO * price;
        let volume = rng.gen_range(MIN_VOLUME..MAX_VOLUME) as f64;

        bars.push(KLineUnit::new(timestamp, open, high, low, close, volume));
        price = close;
        timestamp += conf.step_ms;
    }

    bars
}
