pub mod boll_exception;
pub mod enums;
pub mod time;
pub mod utils;
