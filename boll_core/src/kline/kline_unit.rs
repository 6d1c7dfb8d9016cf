use serde::{Deserialize, Serialize};

use crate::common::{
    boll_exception::{BollException, BollResult, ErrCode},
    enums::PriceSource,
    time::format_timestamp,
};

/// One OHLCV price bar. `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KLineUnit {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl KLineUnit {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar with every price equal to `close`
    pub fn from_close(timestamp: i64, close: f64) -> Self {
        Self::new(timestamp, close, close, close, close, 0.0)
    }

    pub fn get(&self, source: PriceSource) -> f64 {
        match source {
            PriceSource::Close => self.close,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Data-quality check for loaded bars.
    ///
    /// Non-finite fields are always rejected. A `low`/`high` that does not bound
    /// the body is widened when `autofix` is set and rejected otherwise.
    pub fn check(&mut self, autofix: bool) -> BollResult<()> {
        if !self.is_finite() {
            return Err(BollException::new(
                format!(
                    "{} non-finite field in [open={}, high={}, low={}, close={}, volume={}]",
                    format_timestamp(self.timestamp),
                    self.open,
                    self.high,
                    self.low,
                    self.close,
                    self.volume
                ),
                ErrCode::KlDataInvalid,
            ));
        }

        let min_price = self.low.min(self.open).min(self.high).min(self.close);
        let max_price = self.low.max(self.open).max(self.high).max(self.close);

        if self.low > min_price {
            if autofix {
                self.low = min_price;
            } else {
                return Err(BollException::new(
                    format!(
                        "{} low price={} is not min of [low={}, open={}, high={}, close={}]",
                        format_timestamp(self.timestamp),
                        self.low,
                        self.low,
                        self.open,
                        self.high,
                        self.close
                    ),
                    ErrCode::KlDataInvalid,
                ));
            }
        }

        if self.high < max_price {
            if autofix {
                self.high = max_price;
            } else {
                return Err(BollException::new(
                    format!(
                        "{} high price={} is not max of [low={}, open={}, high={}, close={}]",
                        format_timestamp(self.timestamp),
                        self.high,
                        self.low,
                        self.open,
                        self.high,
                        self.close
                    ),
                    ErrCode::KlDataInvalid,
                ));
            }
        }
        Ok(())
    }
}
