pub mod common;
pub mod config;
pub mod kline;
pub mod math;
pub mod overlay;

pub use common::boll_exception::{BollException, BollResult, ErrCode};
pub use common::enums::{MaType, PriceSource};
pub use config::boll_config::BollConfig;
pub use config::boll_settings::BollSettings;
pub use kline::kline_list::KLineList;
pub use kline::kline_unit::KLineUnit;
pub use math::boll::{cal_boll, BollMetric, BollModel};
pub use overlay::boll_overlay::{BollLines, BollOverlay};
