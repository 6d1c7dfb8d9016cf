//! Bollinger Bands over closing prices.
//!
//! `basis` is the simple moving average over `length` bars, the envelope is
//! `basis ± multiplier * stddev` with population variance (divisor `length`).
//! Non-finite closes are not rejected here and propagate into the output.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::{boll_exception::BollResult, utils::clamp_index};
use crate::config::boll_config::BollConfig;
use crate::kline::kline_unit::KLineUnit;

/// Upper bound on the window buffer reserved up front; `length` itself is unbounded
const WINDOW_PREALLOC: usize = 1024;

/// One band value, attributed to `timestamp`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollMetric {
    pub timestamp: i64,
    pub basis: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Mean and population standard deviation of the window, in iteration order.
///
/// Batch and streaming paths both go through here so they agree to the bit.
fn window_stats<'a, I>(window: I, length: usize) -> (f64, f64)
where
    I: Iterator<Item = &'a f64> + Clone,
{
    let n = length as f64;
    let basis = window.clone().sum::<f64>() / n;
    let variance = window.map(|&x| (x - basis).powi(2)).sum::<f64>() / n;
    (basis, variance.sqrt())
}

fn make_metric(timestamp: i64, basis: f64, std_dev: f64, k: f64) -> BollMetric {
    BollMetric {
        timestamp,
        basis,
        upper: basis + k * std_dev,
        lower: basis - k * std_dev,
    }
}

/// Compute Bollinger Bands for every bar that closes a full window.
///
/// Returns `bars.len() - length + 1` points (none when there are fewer bars
/// than `length`), then applies the offset post-pass.
pub fn cal_boll(bars: &[KLineUnit], conf: &BollConfig) -> BollResult<Vec<BollMetric>> {
    conf.validate()?;

    let length = conf.length;
    if bars.len() < length {
        return Ok(Vec::new());
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.get(conf.source)).collect();
    let mut result = Vec::with_capacity(bars.len() - length + 1);

    for i in (length - 1)..bars.len() {
        let window = &closes[i + 1 - length..=i];
        let (basis, std_dev) = window_stats(window.iter(), length);
        result.push(make_metric(
            bars[i].timestamp,
            basis,
            std_dev,
            conf.std_dev_multiplier,
        ));
    }

    apply_offset(&mut result, |idx| bars[idx].timestamp, bars.len(), conf.offset);
    Ok(result)
}

/// Shift the timestamp of point `k` to the bar at `clamp(k + offset)`.
///
/// `k` is the position within `points`, `timestamp_at` resolves a bar index to
/// its timestamp and `bar_count` is the number of bars available. Values are
/// never touched and no point is dropped.
pub fn apply_offset<F>(points: &mut [BollMetric], timestamp_at: F, bar_count: usize, offset: i32)
where
    F: Fn(usize) -> i64,
{
    if offset == 0 || bar_count == 0 {
        return;
    }
    for (k, point) in points.iter_mut().enumerate() {
        point.timestamp = timestamp_at(clamp_index(k as i64 + offset as i64, bar_count));
    }
}

/// Incremental calculator for one append-only bar stream.
///
/// Keeps the last `length` closes, so each new bar costs `O(length)` and
/// yields exactly what [`cal_boll`] would for the same prefix. The state is
/// tied to the config it was built with; use a fresh model (or [`reset`])
/// when parameters change or history is replaced.
///
/// [`reset`]: BollModel::reset
#[derive(Debug, Clone)]
pub struct BollModel {
    conf: BollConfig,
    window: VecDeque<f64>,
    timestamps: Vec<i64>,
    points: Vec<BollMetric>,
}

impl BollModel {
    pub fn new(conf: BollConfig) -> BollResult<Self> {
        conf.validate()?;
        debug!(length = conf.length, k = conf.std_dev_multiplier, offset = conf.offset, "boll model created");
        Ok(Self {
            window: VecDeque::with_capacity(conf.length.min(WINDOW_PREALLOC)),
            conf,
            timestamps: Vec::new(),
            points: Vec::new(),
        })
    }

    pub fn config(&self) -> &BollConfig {
        &self.conf
    }

    /// Number of bars consumed so far
    pub fn bar_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Append one bar. Returns the new point once a full window is available,
    /// with the offset applied against the bars seen so far.
    pub fn add(&mut self, klu: &KLineUnit) -> Option<BollMetric> {
        self.window.push_back(klu.get(self.conf.source));
        if self.window.len() > self.conf.length {
            self.window.pop_front();
        }
        self.timestamps.push(klu.timestamp);

        if self.window.len() < self.conf.length {
            trace!(ts = klu.timestamp, have = self.window.len(), "warming up");
            return None;
        }

        let (basis, std_dev) = window_stats(self.window.iter(), self.conf.length);
        let metric = make_metric(klu.timestamp, basis, std_dev, self.conf.std_dev_multiplier);
        self.points.push(metric);

        let k = self.points.len() - 1;
        Some(self.shifted(k, metric))
    }

    /// Feed several bars, returning the points they produced
    pub fn extend<'a, I>(&mut self, klus: I) -> Vec<BollMetric>
    where
        I: IntoIterator<Item = &'a KLineUnit>,
    {
        klus.into_iter().filter_map(|klu| self.add(klu)).collect()
    }

    /// All points for the current prefix, offset applied. Equal to running
    /// [`cal_boll`] over every bar added so far.
    pub fn points(&self) -> Vec<BollMetric> {
        let mut points = self.points.clone();
        apply_offset(
            &mut points,
            |idx| self.timestamps[idx],
            self.timestamps.len(),
            self.conf.offset,
        );
        points
    }

    /// Latest point, offset applied
    pub fn last(&self) -> Option<BollMetric> {
        let k = self.points.len().checked_sub(1)?;
        Some(self.shifted(k, self.points[k]))
    }

    pub fn reset(&mut self) {
        debug!(bars = self.timestamps.len(), "boll model reset");
        self.window.clear();
        self.timestamps.clear();
        self.points.clear();
    }

    fn shifted(&self, k: usize, mut metric: BollMetric) -> BollMetric {
        if self.conf.offset != 0 {
            let idx = clamp_index(k as i64 + self.conf.offset as i64, self.timestamps.len());
            metric.timestamp = self.timestamps[idx];
        }
        metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bars_from_closes(closes: &[f64]) -> Vec<KLineUnit> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| KLineUnit::from_close(1000 + i as i64 * 60, c))
            .collect()
    }

    fn conf(length: usize, k: f64, offset: i32) -> BollConfig {
        BollConfig::sma_close(length, k, offset).unwrap()
    }

    #[test]
    fn test_known_values() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = cal_boll(&bars, &conf(3, 2.0, 0)).unwrap();

        assert_eq!(result.len(), 3);
        let std = (2.0_f64 / 3.0).sqrt();
        assert_relative_eq!(result[0].basis, 11.0, epsilon = 1e-12);
        assert_relative_eq!(result[0].upper, 11.0 + 2.0 * std, epsilon = 1e-12);
        assert_relative_eq!(result[0].lower, 11.0 - 2.0 * std, epsilon = 1e-12);
        assert_relative_eq!(result[0].upper, 12.633, epsilon = 1e-3);
        assert_relative_eq!(result[0].lower, 9.367, epsilon = 1e-3);
        assert_relative_eq!(result[2].basis, 13.0, epsilon = 1e-12);

        let ts: Vec<i64> = result.iter().map(|p| p.timestamp).collect();
        assert_eq!(ts, vec![bars[2].timestamp, bars[3].timestamp, bars[4].timestamp]);
    }

    #[test]
    fn test_insufficient_data_is_empty() {
        let bars = bars_from_closes(&[1.0, 2.0]);
        assert!(cal_boll(&bars, &conf(3, 2.0, 0)).unwrap().is_empty());
        assert!(cal_boll(&[], &conf(1, 2.0, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_exact_length_gives_one_point() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        assert_eq!(cal_boll(&bars, &conf(3, 2.0, 0)).unwrap().len(), 1);
    }

    #[test]
    fn test_flat_window_collapses_bands() {
        let bars = bars_from_closes(&[5.0; 8]);
        for p in cal_boll(&bars, &conf(4, 2.0, 0)).unwrap() {
            assert_eq!(p.basis, 5.0);
            assert_eq!(p.upper, p.basis);
            assert_eq!(p.lower, p.basis);
        }
    }

    #[test]
    fn test_length_one_tracks_close() {
        let closes = [3.0, 1.5, 7.25, 2.0];
        let bars = bars_from_closes(&closes);
        let result = cal_boll(&bars, &conf(1, 3.0, 0)).unwrap();
        assert_eq!(result.len(), closes.len());
        for (p, c) in result.iter().zip(closes.iter()) {
            assert_eq!(p.basis, *c);
            assert_eq!(p.upper, *c);
            assert_eq!(p.lower, *c);
        }
    }

    #[test]
    fn test_zero_multiplier() {
        let bars = bars_from_closes(&[1.0, 5.0, 2.0, 8.0]);
        for p in cal_boll(&bars, &conf(2, 0.0, 0)).unwrap() {
            assert_eq!(p.upper, p.basis);
            assert_eq!(p.lower, p.basis);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        let mut bad = BollConfig::default();
        bad.length = 0;
        assert!(cal_boll(&bars, &bad).unwrap_err().is_para_err());

        let mut bad = BollConfig::default();
        bad.std_dev_multiplier = -1.0;
        assert!(cal_boll(&bars, &bad).unwrap_err().is_para_err());

        // parameter errors win over insufficient data
        let mut bad = BollConfig::default();
        bad.std_dev_multiplier = f64::NAN;
        assert!(cal_boll(&[], &bad).is_err());
    }

    #[test]
    fn test_nan_close_propagates() {
        let bars = bars_from_closes(&[1.0, f64::NAN, 3.0, 4.0, 5.0]);
        let result = cal_boll(&bars, &conf(2, 2.0, 0)).unwrap();
        assert!(result[0].basis.is_nan());
        assert!(result[1].upper.is_nan());
        assert!(result[2].basis.is_finite());
        assert_relative_eq!(result[3].basis, 4.5, epsilon = 1e-12);
    }

    #[test]
    fn test_infinite_close_propagates() {
        let bars = bars_from_closes(&[1.0, f64::INFINITY]);
        let result = cal_boll(&bars, &conf(2, 2.0, 0)).unwrap();
        assert!(!result[0].basis.is_finite());
    }

    #[test]
    fn test_positive_offset_uses_point_position() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let plain = cal_boll(&bars, &conf(3, 2.0, 0)).unwrap();
        let shifted = cal_boll(&bars, &conf(3, 2.0, 1)).unwrap();

        let ts: Vec<i64> = shifted.iter().map(|p| p.timestamp).collect();
        assert_eq!(ts, vec![bars[1].timestamp, bars[2].timestamp, bars[3].timestamp]);
        for (a, b) in plain.iter().zip(shifted.iter()) {
            assert_eq!((a.basis, a.upper, a.lower), (b.basis, b.upper, b.lower));
        }
    }

    #[test]
    fn test_offset_clamps_at_both_ends() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]);

        let late = cal_boll(&bars, &conf(3, 2.0, 50)).unwrap();
        assert_eq!(late.len(), 3);
        assert!(late.iter().all(|p| p.timestamp == bars[4].timestamp));

        let early = cal_boll(&bars, &conf(3, 2.0, -50)).unwrap();
        assert_eq!(early.len(), 3);
        assert!(early.iter().all(|p| p.timestamp == bars[0].timestamp));

        let back_one = cal_boll(&bars, &conf(3, 2.0, -1)).unwrap();
        let ts: Vec<i64> = back_one.iter().map(|p| p.timestamp).collect();
        assert_eq!(ts, vec![bars[0].timestamp, bars[0].timestamp, bars[1].timestamp]);
    }

    #[test]
    fn test_model_matches_batch_on_every_prefix() {
        let closes = [10.0, 10.4, 9.7, 11.2, 12.5, 12.1, 11.8, 13.3, 12.9, 14.0];
        let bars = bars_from_closes(&closes);
        for offset in [-4, 0, 2] {
            let c = conf(4, 2.0, offset);
            let mut model = BollModel::new(c.clone()).unwrap();
            for n in 1..=bars.len() {
                let produced = model.add(&bars[n - 1]);
                let batch = cal_boll(&bars[..n], &c).unwrap();
                assert_eq!(model.points(), batch);
                assert_eq!(produced, batch.last().copied());
                assert_eq!(model.last(), batch.last().copied());
            }
        }
    }

    #[test]
    fn test_model_reset() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let mut model = BollModel::new(conf(2, 2.0, 0)).unwrap();
        assert_eq!(model.extend(&bars).len(), 3);
        model.reset();
        assert_eq!(model.bar_count(), 0);
        assert!(model.points().is_empty());
        assert!(model.last().is_none());
        assert!(model.add(&bars[0]).is_none());
    }

    #[test]
    fn test_model_rejects_invalid_config() {
        let mut bad = BollConfig::default();
        bad.length = 0;
        assert!(BollModel::new(bad).is_err());
    }

    #[test]
    fn test_model_with_huge_length_stays_empty() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        let c = conf(usize::MAX / 4, 2.0, 0);
        let mut model = BollModel::new(c.clone()).unwrap();
        assert!(model.extend(&bars).is_empty());
        assert!(model.points().is_empty());
        assert_eq!(model.points(), cal_boll(&bars, &c).unwrap());
    }
}
