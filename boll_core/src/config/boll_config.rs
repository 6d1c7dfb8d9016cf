use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::{
    boll_exception::{BollException, BollResult, ErrCode},
    enums::{MaType, PriceSource},
};

pub const DEFAULT_LENGTH: usize = 20;
pub const DEFAULT_STD_DEV_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_OFFSET: i32 = 0;

/// Bollinger Bands parameters.
///
/// Only constructed through [`BollConfig::new`] / [`BollConfig::from_json`] /
/// `Default`, so a value in hand has already passed validation. The calculator
/// still re-validates because the fields are public.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollConfig {
    /// Window size in bars
    pub length: usize,
    pub ma_type: MaType,
    pub source: PriceSource,
    /// Scales the standard deviation into the band width
    pub std_dev_multiplier: f64,
    /// Bar shift applied to output timestamps only
    pub offset: i32,
}

impl Default for BollConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            ma_type: MaType::Sma,
            source: PriceSource::Close,
            std_dev_multiplier: DEFAULT_STD_DEV_MULTIPLIER,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl BollConfig {
    pub fn new(
        length: usize,
        ma_type: MaType,
        source: PriceSource,
        std_dev_multiplier: f64,
        offset: i32,
    ) -> BollResult<Self> {
        let config = Self {
            length,
            ma_type,
            source,
            std_dev_multiplier,
            offset,
        };
        config.validate()?;
        Ok(config)
    }

    /// SMA of close with the given window, multiplier and offset
    pub fn sma_close(length: usize, std_dev_multiplier: f64, offset: i32) -> BollResult<Self> {
        Self::new(length, MaType::Sma, PriceSource::Close, std_dev_multiplier, offset)
    }

    pub fn validate(&self) -> BollResult<()> {
        if self.length < 1 {
            return Err(BollException::invalid_parameter(format!(
                "length={} must be >= 1",
                self.length
            )));
        }
        if !self.std_dev_multiplier.is_finite() {
            return Err(BollException::invalid_parameter(format!(
                "std_dev_multiplier={} must be finite",
                self.std_dev_multiplier
            )));
        }
        if self.std_dev_multiplier < 0.0 {
            return Err(BollException::invalid_parameter(format!(
                "std_dev_multiplier={} must be >= 0",
                self.std_dev_multiplier
            )));
        }
        Ok(())
    }

    /// Build from a key/value document. Missing keys take defaults, unknown
    /// keys are rejected.
    pub fn from_json(conf: Option<HashMap<String, serde_json::Value>>) -> BollResult<Self> {
        let mut conf = ConfigWithCheck::new(conf.unwrap_or_default());
        let default = Self::default();

        let length = match conf.get::<i64>("length")? {
            Some(v) if v < 1 => {
                return Err(BollException::invalid_parameter(format!(
                    "length={} must be >= 1",
                    v
                )))
            }
            Some(v) => v as usize,
            None => default.length,
        };

        let ma_type = match conf.get::<String>("ma_type")? {
            Some(s) => MaType::from_str(&s).map_err(|_| {
                BollException::invalid_parameter(format!("unsupported ma_type={}", s))
            })?,
            None => default.ma_type,
        };

        let source = match conf.get::<String>("source")? {
            Some(s) => PriceSource::from_str(&s).map_err(|_| {
                BollException::invalid_parameter(format!("unsupported source={}", s))
            })?,
            None => default.source,
        };

        let offset = match conf.get::<i64>("offset")? {
            Some(v) => i32::try_from(v).map_err(|_| {
                BollException::invalid_parameter(format!("offset={} out of range", v))
            })?,
            None => default.offset,
        };

        let std_dev_multiplier = conf
            .get::<f64>("std_dev_multiplier")?
            .unwrap_or(default.std_dev_multiplier);

        conf.check()?;
        Self::new(length, ma_type, source, std_dev_multiplier, offset)
    }
}

/// Key/value config that remembers which keys were read, so leftovers can be
/// reported as unknown.
struct ConfigWithCheck {
    conf: HashMap<String, serde_json::Value>,
    visited: HashSet<String>,
}

impl ConfigWithCheck {
    fn new(conf: HashMap<String, serde_json::Value>) -> Self {
        Self {
            conf,
            visited: HashSet::new(),
        }
    }

    fn get<T: DeserializeOwned>(&mut self, key: &str) -> BollResult<Option<T>> {
        self.visited.insert(key.to_string());
        match self.conf.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
                BollException::new(
                    format!("config key '{}' has wrong type ({}): {}", key, v, e),
                    ErrCode::ConfigError,
                )
            }),
        }
    }

    fn check(&self) -> BollResult<()> {
        let mut unknown: Vec<&String> = self
            .conf
            .keys()
            .filter(|k| !self.visited.contains(*k))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort();
        Err(BollException::invalid_parameter(format!(
            "unknown para = {:?}",
            unknown
        )))
    }
}
