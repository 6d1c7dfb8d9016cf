use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Error codes for the band calculator and its data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum ErrCode {
    // Parameter errors (0-99)
    #[strum(serialize = "_PARA_ERR_BEGIN")]
    ParaErrBegin = 0,
    #[strum(serialize = "INVALID_PARAMETER")]
    InvalidParameter = 1,
    #[strum(serialize = "CONFIG_ERROR")]
    ConfigError = 2,
    #[strum(serialize = "_PARA_ERR_END")]
    ParaErrEnd = 99,

    // KL data errors (200-299)
    #[strum(serialize = "_KL_ERR_BEGIN")]
    KlErrBegin = 200,
    #[strum(serialize = "SRC_DATA_NOT_FOUND")]
    SrcDataNotFound = 201,
    #[strum(serialize = "SRC_DATA_FORMAT_ERROR")]
    SrcDataFormatError = 202,
    #[strum(serialize = "KL_DATA_INVALID")]
    KlDataInvalid = 203,
    #[strum(serialize = "KL_NOT_MONOTONOUS")]
    KlNotMonotonous = 204,
    #[strum(serialize = "NO_DATA")]
    NoData = 205,
    #[strum(serialize = "_KL_ERR_END")]
    KlErrEnd = 299,
}

impl ErrCode {
    pub fn is_para_err(&self) -> bool {
        let code = *self as i32;
        code > Self::ParaErrBegin as i32 && code < Self::ParaErrEnd as i32
    }

    pub fn is_kldata_err(&self) -> bool {
        let code = *self as i32;
        code > Self::KlErrBegin as i32 && code < Self::KlErrEnd as i32
    }
}

#[derive(Debug, Clone, Error)]
#[error("{errcode}: {msg}")]
pub struct BollException {
    pub errcode: ErrCode,
    pub msg: String,
}

impl BollException {
    pub fn new(message: impl Into<String>, code: ErrCode) -> Self {
        Self {
            errcode: code,
            msg: message.into(),
        }
    }

    /// Shorthand for the most common failure: a parameter outside its domain.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(message, ErrCode::InvalidParameter)
    }

    pub fn is_para_err(&self) -> bool {
        self.errcode.is_para_err()
    }

    pub fn is_kldata_err(&self) -> bool {
        self.errcode.is_kldata_err()
    }
}

pub type BollResult<T> = Result<T, BollException>;
