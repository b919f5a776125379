use std::io;

use thiserror::Error;

use crate::LumpId;

/// Errors produced while reading or rewriting a BSP file.
#[derive(Error, Debug)]
pub enum BspError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Not a BSP file: bad header signature")]
    InvalidMagic,

    #[error("Unsupported BSP version {0}")]
    UnsupportedVersion(i32),

    #[error("BSP header is truncated")]
    Truncated,

    #[error("Lump {lump} lies outside the file (offset {offset}, length {length}, file size {file_size})")]
    LumpOutOfBounds {
        lump: LumpId,
        offset: i32,
        length: i32,
        file_size: usize,
    },

    #[error("Lump id {0} is out of range, BSP files have 64 lumps")]
    InvalidLumpId(u32),

    #[error("Rewritten BSP would exceed the 2 GiB offset range")]
    TooLarge,

    #[error("Binary format error: {0}")]
    Binary(binrw::Error),
}

impl From<binrw::Error> for BspError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            return BspError::Truncated;
        }
        match err {
            binrw::Error::BadMagic { .. } => BspError::InvalidMagic,
            binrw::Error::Backtrace(backtrace) => Self::from(*backtrace.error),
            other => BspError::Binary(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, BspError>;
