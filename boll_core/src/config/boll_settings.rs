use tracing::debug;

use super::boll_config::{BollConfig, DEFAULT_LENGTH, DEFAULT_OFFSET, DEFAULT_STD_DEV_MULTIPLIER};
use crate::common::{
    boll_exception::BollResult,
    enums::{MaType, PriceSource},
    utils::{parse_or, str2float},
};

pub const LENGTH_RANGE: (usize, usize) = (1, 100);
pub const MULTIPLIER_RANGE: (f64, f64) = (0.1, 10.0);
pub const OFFSET_RANGE: (i32, i32) = (-50, 50);

/// Raw user input from a settings form.
///
/// This is where unparseable or out-of-domain input is repaired; the
/// calculator only ever sees the resulting [`BollConfig`].
#[derive(Debug, Clone, Default)]
pub struct BollSettings {
    pub length: String,
    pub ma_type: MaType,
    pub source: PriceSource,
    pub std_dev_multiplier: String,
    pub offset: String,
}

impl BollSettings {
    pub fn new(length: &str, std_dev_multiplier: &str, offset: &str) -> Self {
        Self {
            length: length.to_string(),
            ma_type: MaType::Sma,
            source: PriceSource::Close,
            std_dev_multiplier: std_dev_multiplier.to_string(),
            offset: offset.to_string(),
        }
    }

    /// Window size; unparseable or zero input reads as the default
    pub fn length(&self) -> usize {
        match parse_or(&self.length, DEFAULT_LENGTH) {
            0 => DEFAULT_LENGTH,
            v => v.clamp(LENGTH_RANGE.0, LENGTH_RANGE.1),
        }
    }

    /// Multiplier; unparseable or zero input reads as the default
    pub fn std_dev_multiplier(&self) -> f64 {
        let v = str2float(&self.std_dev_multiplier, DEFAULT_STD_DEV_MULTIPLIER);
        if v == 0.0 {
            return DEFAULT_STD_DEV_MULTIPLIER;
        }
        v.clamp(MULTIPLIER_RANGE.0, MULTIPLIER_RANGE.1)
    }

    pub fn offset(&self) -> i32 {
        parse_or(&self.offset, DEFAULT_OFFSET).clamp(OFFSET_RANGE.0, OFFSET_RANGE.1)
    }

    pub fn to_config(&self) -> BollResult<BollConfig> {
        let config = BollConfig::new(
            self.length(),
            self.ma_type,
            self.source,
            self.std_dev_multiplier(),
            self.offset(),
        )?;
        debug!(?config, "settings resolved");
        Ok(config)
    }
}

impl From<&BollConfig> for BollSettings {
    fn from(conf: &BollConfig) -> Self {
        Self {
            length: conf.length.to_string(),
            ma_type: conf.ma_type,
            source: conf.source,
            std_dev_multiplier: conf.std_dev_multiplier.to_string(),
            offset: conf.offset.to_string(),
        }
    }
}
