use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Moving average used for the basis line
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum MaType {
    #[default]
    #[strum(serialize = "SMA")]
    #[serde(rename = "SMA")]
    Sma,
}

/// Price field the bands are computed from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum PriceSource {
    #[default]
    #[strum(serialize = "close")]
    #[serde(rename = "close")]
    Close,
}

/// Column names of a bar record
#[derive(Debug, Clone)]
pub struct DataField;

impl DataField {
    pub const FIELD_TIME: &'static str = "timestamp";
    pub const FIELD_OPEN: &'static str = "open";
    pub const FIELD_HIGH: &'static str = "high";
    pub const FIELD_LOW: &'static str = "low";
    pub const FIELD_CLOSE: &'static str = "close";
    pub const FIELD_VOLUME: &'static str = "volume";
}

pub const BAR_FIELDS: &[&str] = &[
    DataField::FIELD_TIME,
    DataField::FIELD_OPEN,
    DataField::FIELD_HIGH,
    DataField::FIELD_LOW,
    DataField::FIELD_CLOSE,
    DataField::FIELD_VOLUME,
];
