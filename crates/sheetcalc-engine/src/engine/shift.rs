//! Reference rewriting for structural edits and formula extension.
//!
//! Formulas store references as text, so inserting or deleting a row or
//! column means rewriting every reference token that moved. Literal text
//! arguments (`[...]`) are left untouched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::error::FormulaError;

/// Operation for shifting cell references in formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRow(usize),
    DeleteRow(usize),
    InsertColumn(usize),
    DeleteColumn(usize),
}

fn reference_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]+)([0-9]+)\b").expect("reference token regex must compile")
    })
}

impl ShiftOperation {
    /// Where `cell` ends up after the operation, or None if it was deleted.
    pub fn apply(&self, cell: CellRef) -> Option<CellRef> {
        match *self {
            ShiftOperation::InsertRow(at) if cell.row >= at => Some(CellRef::new(cell.row + 1, cell.col)),
            ShiftOperation::InsertColumn(at) if cell.col >= at => Some(CellRef::new(cell.row, cell.col + 1)),
            ShiftOperation::DeleteRow(at) if cell.row == at => None,
            ShiftOperation::DeleteRow(at) if cell.row > at => Some(CellRef::new(cell.row - 1, cell.col)),
            ShiftOperation::DeleteColumn(at) if cell.col == at => None,
            ShiftOperation::DeleteColumn(at) if cell.col > at => Some(CellRef::new(cell.row, cell.col - 1)),
            _ => Some(cell),
        }
    }
}

/// Shift cell references in a formula when rows/cols are inserted/deleted.
///
/// - Insert row at R: refs to row >= R become row + 1
/// - Delete row at R: refs to row > R become row - 1; row == R becomes `#REF!`
/// - Same logic for columns
pub fn shift_formula_references(formula: &str, op: ShiftOperation) -> String {
    rewrite_references(formula, |cell| op.apply(cell))
}

/// Offset all cell references in a formula by a relative row/column delta.
/// References pushed above row 0 or left of column A become `#REF!`.
pub fn offset_formula_references(formula: &str, delta_row: isize, delta_col: isize) -> String {
    if delta_row == 0 && delta_col == 0 {
        return formula.to_string();
    }
    rewrite_references(formula, |cell| cell.offset(delta_row, delta_col))
}

fn rewrite_references(formula: &str, mut map: impl FnMut(CellRef) -> Option<CellRef>) -> String {
    let mut rewrite_segment = |segment: &str| {
        reference_token_re()
            .replace_all(segment, |caps: &Captures| match CellRef::from_str(&caps[0]) {
                Some(cell) => match map(cell) {
                    Some(moved) => moved.to_string(),
                    None => FormulaError::StructuralReference.sentinel().to_string(),
                },
                None => caps[0].to_string(),
            })
            .into_owned()
    };

    let mut out = String::with_capacity(formula.len());
    let mut rest = formula;
    while let Some(open) = rest.find('[') {
        out.push_str(&rewrite_segment(&rest[..open]));
        match rest[open..].find(']') {
            Some(close) => {
                out.push_str(&rest[open..=open + close]);
                rest = &rest[open + close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(&rewrite_segment(rest));
    out
}
