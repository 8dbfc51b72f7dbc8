//! Cell data structures for the sheet grid.
//!
//! - [`CellContent`] - What a cell holds: a literal or a [`Formula`]
//! - [`Cell`] - A cell with a stable identity and its current coordinate
//! - [`CachedValue`] - Explicit stale/fresh state of a formula's display value

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cell_ref::CellRef;
use super::error::FormulaError;
use super::parameter::Parameter;
use crate::builtins::Function;

/// Stable identity of a cell.
///
/// Coordinates change under structural edits; identities never do, so the
/// reference graph is keyed by this instead of by position.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CachedValue {
    Stale,
    Fresh(String),
}

/// A formula cell: the function it runs, the raw input it came from and the
/// arguments resolved from that input on the last parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub function: Function,
    pub input: String,
    pub body: Result<Vec<Parameter>, FormulaError>,
    pub value: CachedValue,
}

impl Formula {
    pub fn new(function: Function, input: &str, body: Result<Vec<Parameter>, FormulaError>) -> Formula {
        Formula {
            function,
            input: input.to_string(),
            body,
            value: CachedValue::Stale,
        }
    }

    /// Run the function over the resolved arguments.
    pub fn evaluate(&self) -> String {
        match &self.body {
            Ok(params) => self.function.evaluate(params),
            Err(e) => e.sentinel().to_string(),
        }
    }

    /// Compute and cache the display value.
    pub fn refresh(&mut self) {
        self.value = CachedValue::Fresh(self.evaluate());
    }

    pub fn invalidate(&mut self) {
        self.value = CachedValue::Stale;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellContent {
    Literal(String),
    Formula(Formula),
}

impl CellContent {
    pub fn empty() -> CellContent {
        CellContent::Literal(String::new())
    }
}

/// A cell in the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub at: CellRef,
    pub content: CellContent,
}

impl Cell {
    pub fn new_empty(id: CellId, at: CellRef) -> Cell {
        Cell {
            id,
            at,
            content: CellContent::empty(),
        }
    }

    /// What the user typed into the cell.
    pub fn input(&self) -> &str {
        match &self.content {
            CellContent::Literal(text) => text,
            CellContent::Formula(formula) => &formula.input,
        }
    }

    /// The value shown for the cell. A stale formula is evaluated on the fly.
    pub fn display(&self) -> String {
        match &self.content {
            CellContent::Literal(text) => text.clone(),
            CellContent::Formula(formula) => match &formula.value {
                CachedValue::Fresh(value) => value.clone(),
                CachedValue::Stale => formula.evaluate(),
            },
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.content, CellContent::Formula(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.content, CellContent::Literal(text) if text.is_empty())
    }

    pub fn formula_mut(&mut self) -> Option<&mut Formula> {
        match &mut self.content {
            CellContent::Formula(formula) => Some(formula),
            CellContent::Literal(_) => None,
        }
    }
}
