pub mod boll_config;
pub mod boll_settings;
