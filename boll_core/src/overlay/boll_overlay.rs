use tracing::{debug, warn};

use crate::common::boll_exception::BollResult;
use crate::config::boll_config::BollConfig;
use crate::kline::kline_unit::KLineUnit;
use crate::math::boll::{BollMetric, BollModel};

/// Three line series ready for a renderer, as `(timestamp, value)` pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollLines {
    pub upper: Vec<(i64, f64)>,
    pub basis: Vec<(i64, f64)>,
    pub lower: Vec<(i64, f64)>,
}

/// Band state for a single chart series.
///
/// Owns the incremental model. New bars appended to the series are fed
/// through it; anything else (history reload, edited bar, new parameters)
/// rebuilds it from scratch. A rejected parameter set leaves the last valid
/// result in place.
#[derive(Debug, Clone)]
pub struct BollOverlay {
    model: BollModel,
    /// `(timestamp, close bits)` of every bar fed to the model
    seen: Vec<(i64, u64)>,
    result: Vec<BollMetric>,
}

impl BollOverlay {
    pub fn new(conf: BollConfig) -> BollResult<Self> {
        Ok(Self {
            model: BollModel::new(conf)?,
            seen: Vec::new(),
            result: Vec::new(),
        })
    }

    pub fn config(&self) -> &BollConfig {
        self.model.config()
    }

    /// Swap parameters. On error the previous parameters and result stay.
    pub fn set_config(&mut self, conf: BollConfig) -> BollResult<()> {
        if &conf == self.model.config() {
            return Ok(());
        }
        match BollModel::new(conf) {
            Ok(model) => {
                debug!(config = ?model.config(), "overlay parameters changed");
                self.model = model;
                self.seen.clear();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "rejected band parameters, keeping last valid result");
                Err(e)
            }
        }
    }

    /// Bring the result up to date with `bars` and return it.
    pub fn update(&mut self, bars: &[KLineUnit]) -> &[BollMetric] {
        let seen = self.seen.len();

        if self.is_append_of_seen(bars) {
            self.model.extend(&bars[seen..]);
        } else {
            debug!(seen, incoming = bars.len(), "bar history replaced, rebuilding");
            self.model.reset();
            self.seen.clear();
            self.model.extend(bars);
        }

        let fed = self.seen.len();
        self.seen.extend(bars[fed..].iter().map(fingerprint));
        self.result = self.model.points();
        &self.result
    }

    /// Last successfully computed result
    pub fn last_valid(&self) -> &[BollMetric] {
        &self.result
    }

    pub fn lines(&self) -> BollLines {
        let mut lines = BollLines::default();
        for p in &self.result {
            lines.upper.push((p.timestamp, p.upper));
            lines.basis.push((p.timestamp, p.basis));
            lines.lower.push((p.timestamp, p.lower));
        }
        lines
    }

    /// True when every bar fed so far is still at the front of `bars`, unchanged.
    fn is_append_of_seen(&self, bars: &[KLineUnit]) -> bool {
        bars.len() >= self.seen.len()
            && bars
                .iter()
                .zip(self.seen.iter())
                .all(|(bar, seen)| fingerprint(bar) == *seen)
    }
}

fn fingerprint(bar: &KLineUnit) -> (i64, u64) {
    (bar.timestamp, bar.close.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::boll::cal_boll;

    fn bars(closes: &[f64]) -> Vec<KLineUnit> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| KLineUnit::from_close(i as i64, c))
            .collect()
    }

    #[test]
    fn test_incremental_updates_match_batch() {
        let conf = BollConfig::sma_close(3, 2.0, 0).unwrap();
        let all = bars(&[1.0, 2.0, 4.0, 3.0, 5.0, 6.0, 2.0]);
        let mut overlay = BollOverlay::new(conf.clone()).unwrap();
        for n in 0..=all.len() {
            let got = overlay.update(&all[..n]).to_vec();
            assert_eq!(got, cal_boll(&all[..n], &conf).unwrap());
        }
    }

    #[test]
    fn test_history_reload_rebuilds() {
        let conf = BollConfig::sma_close(2, 2.0, 0).unwrap();
        let mut overlay = BollOverlay::new(conf.clone()).unwrap();
        overlay.update(&bars(&[1.0, 2.0, 3.0]));

        let mut edited = bars(&[1.0, 2.0, 3.0, 4.0]);
        edited[0].close = 30.0;
        let got = overlay.update(&edited).to_vec();
        assert_eq!(got, cal_boll(&edited, &conf).unwrap());

        let shorter = bars(&[7.0, 8.0]);
        let got = overlay.update(&shorter).to_vec();
        assert_eq!(got, cal_boll(&shorter, &conf).unwrap());
    }

    #[test]
    fn test_parameter_change_recomputes() {
        let data = bars(&[1.0, 2.0, 4.0, 3.0, 5.0]);
        let mut overlay = BollOverlay::new(BollConfig::sma_close(2, 2.0, 0).unwrap()).unwrap();
        overlay.update(&data);

        let new_conf = BollConfig::sma_close(3, 1.0, 1).unwrap();
        overlay.set_config(new_conf.clone()).unwrap();
        let got = overlay.update(&data).to_vec();
        assert_eq!(got, cal_boll(&data, &new_conf).unwrap());
    }

    #[test]
    fn test_invalid_parameters_keep_last_valid() {
        let data = bars(&[1.0, 2.0, 4.0, 3.0]);
        let conf = BollConfig::sma_close(2, 2.0, 0).unwrap();
        let mut overlay = BollOverlay::new(conf.clone()).unwrap();
        let before = overlay.update(&data).to_vec();

        let mut bad = conf.clone();
        bad.length = 0;
        assert!(overlay.set_config(bad).unwrap_err().is_para_err());
        assert_eq!(overlay.config(), &conf);
        assert_eq!(overlay.last_valid(), before.as_slice());
        assert_eq!(overlay.update(&data), before.as_slice());
    }

    #[test]
    fn test_lines_split() {
        let mut overlay = BollOverlay::new(BollConfig::sma_close(1, 2.0, 0).unwrap()).unwrap();
        overlay.update(&bars(&[4.0, 5.0]));
        let lines = overlay.lines();
        assert_eq!(lines.basis, vec![(0, 4.0), (1, 5.0)]);
        assert_eq!(lines.upper, lines.basis);
        assert_eq!(lines.lower, lines.basis);
    }

    #[test]
    fn test_huge_length_yields_nothing() {
        let data = bars(&[1.0, 2.0, 3.0]);
        let mut overlay = BollOverlay::new(BollConfig::sma_close(2, 2.0, 0).unwrap()).unwrap();
        overlay.update(&data);

        overlay.set_config(BollConfig::sma_close(1_000_000_000_000, 2.0, 0).unwrap()).unwrap();
        assert!(overlay.update(&data).is_empty());
        assert!(overlay.lines().basis.is_empty());
    }
}
