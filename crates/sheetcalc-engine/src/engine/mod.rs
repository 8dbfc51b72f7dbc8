//! Spreadsheet engine API.
//!
//! This module provides the computation core for a single sheet:
//!
//! - [`Cell`], [`CellContent`], [`Formula`], [`CachedValue`] - Cell storage
//! - [`CellRef`] - Cell reference parsing (A0 notation ↔ row/col indices)
//! - [`Parameter`] - Resolved function arguments
//! - [`ReferenceGraph`] and [`creates_cycle`] - Dependency edges and the cycle test
//! - [`parse`] - Formula tokenizer/parser over a [`CellSource`]
//! - [`shift_formula_references`] - Rewrite formulas on structural edits
//! - [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod error;
mod format;
mod parameter;
mod parse;
mod references;
mod shift;

pub use cell::{CachedValue, Cell, CellContent, CellId, Formula};
pub use cell_ref::{CellRef, letter_to_number, number_to_letter};
pub use cycle::creates_cycle;
pub use error::{FormulaError, is_sentinel};
pub use format::{format_number, parse_number};
pub use parameter::Parameter;
pub use parse::{CellSource, Outcome, Parsed, parse, strip_spaces};
pub use references::ReferenceGraph;
pub use shift::{ShiftOperation, offset_formula_references, shift_formula_references};
