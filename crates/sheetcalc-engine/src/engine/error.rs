//! Formula failures and their display sentinels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a formula could not produce a value.
///
/// These never surface as `Err` to callers of the sheet: a failing formula
/// simply displays the sentinel returned by [`FormulaError::sentinel`].
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormulaError {
    /// `=` with nothing after it.
    #[error("empty formula")]
    Empty,

    /// Function name missing or not registered.
    #[error("unknown function")]
    UnknownFunction,

    /// Wrong argument count or type, or a malformed call.
    #[error("wrong number or type of arguments")]
    ArityOrType,

    /// Self, cyclic, out-of-bounds or otherwise unusable reference.
    #[error("invalid reference")]
    Reference,

    /// The formula referenced a row or column that has since been deleted.
    #[error("reference to a deleted row or column")]
    StructuralReference,
}

impl FormulaError {
    pub fn sentinel(&self) -> &'static str {
        match self {
            FormulaError::Empty => "#ERROR",
            FormulaError::UnknownFunction | FormulaError::ArityOrType => "#NAME?",
            FormulaError::Reference | FormulaError::StructuralReference => "#REF!",
        }
    }
}

/// Whether a display value is one of the error sentinels.
pub fn is_sentinel(value: &str) -> bool {
    matches!(value, "#ERROR" | "#NAME?" | "#REF!")
}
