//! Error types for the sheet model.

use thiserror::Error;

/// Errors surfaced to callers of [`crate::Sheet`].
///
/// Formula failures are not errors here; they are display values.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("cell ({row}, {col}) is outside the sheet")]
    OutOfBounds { row: usize, col: usize },

    #[error("index {index} is out of range for {len} lines")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("the sheet cannot grow past {limit} lines")]
    LimitReached { limit: usize },

    #[error("cannot delete the last remaining line")]
    LastLine,

    #[error("block sizes differ: {left} source cells, {right} destination cells")]
    LengthMismatch { left: usize, right: usize },

    #[error("no cells selected")]
    EmptySelection,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
