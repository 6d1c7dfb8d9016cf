pub mod kline_list;
pub mod kline_unit;
pub mod sample;
