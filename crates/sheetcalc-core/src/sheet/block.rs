//! Operations over caller-supplied lists of cells.
//!
//! Every operation validates all coordinates before it mutates anything.

use sheetcalc_engine::engine::{CellContent, CellId, CellRef, offset_formula_references};
use tracing::debug;

use super::Sheet;
use super::natural_order::compare_values;
use crate::error::{Result, SheetError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl Sheet {
    fn check_pair(&self, from: &[CellRef], to: &[CellRef]) -> Result<()> {
        if from.len() != to.len() {
            return Err(SheetError::LengthMismatch {
                left: from.len(),
                right: to.len(),
            });
        }
        if from.is_empty() {
            return Err(SheetError::EmptySelection);
        }
        self.check_all_bounds(from)?;
        self.check_all_bounds(to)
    }

    /// Replace a cell with a literal, dropping any formula and its references.
    fn write_literal(&mut self, at: CellRef, text: String) -> CellId {
        let id = self.cell(at).id;
        self.references.erase_all_of(id);
        self.cell_mut(at).content = CellContent::Literal(text);
        id
    }

    /// Install each input at its cell, then recompute everything downstream.
    fn install_all(&mut self, entries: Vec<(CellRef, String)>) {
        let mut changed = Vec::with_capacity(entries.len());
        for (at, input) in entries {
            self.install(at, &input);
            changed.push(self.cell(at).id);
        }
        self.propagate(&changed);
    }

    /// Copy the inputs of `from` into `to`, pairwise. Formulas are
    /// reinstalled verbatim, so the copy reads the same cells as the original.
    pub fn copy_block(&mut self, from: &[CellRef], to: &[CellRef]) -> Result<()> {
        self.check_pair(from, to)?;
        let inputs: Vec<String> = from.iter().map(|at| self.cell(*at).input().to_string()).collect();
        self.install_all(to.iter().copied().zip(inputs).collect());
        debug!(cells = from.len(), "copied block");
        Ok(())
    }

    /// Like [`Sheet::copy_block`], but the sources are cleared first.
    pub fn move_block(&mut self, from: &[CellRef], to: &[CellRef]) -> Result<()> {
        self.check_pair(from, to)?;
        let inputs: Vec<String> = from.iter().map(|at| self.cell(*at).input().to_string()).collect();
        let mut cleared = Vec::with_capacity(from.len());
        for at in from {
            cleared.push(self.write_literal(*at, String::new()));
        }
        self.install_all(to.iter().copied().zip(inputs).collect());
        // Sources that were not overwritten still have readers to update.
        self.propagate(&cleared);
        debug!(cells = from.len(), "moved block");
        Ok(())
    }

    /// Sort the display values of `cells` and write them back, in the given
    /// cell order, as literals. Formulas in the block are discarded.
    pub fn sort_block(&mut self, cells: &[CellRef], order: SortOrder) -> Result<()> {
        if cells.is_empty() {
            return Err(SheetError::EmptySelection);
        }
        self.check_all_bounds(cells)?;

        let mut values: Vec<String> = cells.iter().map(|at| self.cell(*at).display()).collect();
        values.sort_by(|a, b| match order {
            SortOrder::Ascending => compare_values(a, b),
            SortOrder::Descending => match (a.is_empty(), b.is_empty()) {
                (false, false) => compare_values(b, a),
                _ => compare_values(a, b),
            },
        });

        let mut changed = Vec::with_capacity(cells.len());
        for (at, value) in cells.iter().zip(values) {
            changed.push(self.write_literal(*at, value));
        }
        self.propagate(&changed);
        debug!(cells = cells.len(), ?order, "sorted block");
        Ok(())
    }

    /// Cells of `cells` whose display value contains `needle`.
    pub fn search_block(&self, cells: &[CellRef], needle: &str) -> Result<Vec<CellRef>> {
        self.check_all_bounds(cells)?;
        Ok(cells
            .iter()
            .copied()
            .filter(|at| self.cell(*at).display().contains(needle))
            .collect())
    }

    /// In every cell whose display value contains `needle`, replace it with
    /// `replacement`. Matching cells become literals of the replaced value.
    pub fn replace_block(&mut self, cells: &[CellRef], needle: &str, replacement: &str) -> Result<()> {
        let matches = self.search_block(cells, needle)?;
        let mut changed = Vec::with_capacity(matches.len());
        for at in &matches {
            let value = self.cell(*at).display().replace(needle, replacement);
            changed.push(self.write_literal(*at, value));
        }
        self.propagate(&changed);
        debug!(matched = matches.len(), "replaced in block");
        Ok(())
    }

    /// Empty every cell in `cells`.
    pub fn clear_block(&mut self, cells: &[CellRef]) -> Result<()> {
        self.check_all_bounds(cells)?;
        let changed: Vec<CellId> = cells
            .iter()
            .map(|at| self.write_literal(*at, String::new()))
            .collect();
        self.propagate(&changed);
        Ok(())
    }

    /// Enter the same input into every cell in `cells`.
    pub fn set_block(&mut self, cells: &[CellRef], input: &str) -> Result<()> {
        self.check_all_bounds(cells)?;
        self.install_all(cells.iter().map(|at| (*at, input.to_string())).collect());
        Ok(())
    }

    /// Enter `input` into the first cell and a relative copy of it into each
    /// following cell, with references offset by that cell's distance from
    /// the first one. Literal input is copied unchanged.
    pub fn extend_formula(&mut self, cells: &[CellRef], input: &str) -> Result<()> {
        let Some(first) = cells.first().copied() else {
            return Err(SheetError::EmptySelection);
        };
        self.check_all_bounds(cells)?;

        if !input.starts_with('=') {
            self.install_all(cells.iter().map(|at| (*at, input.to_string())).collect());
            debug!(cells = cells.len(), input, "extended literal");
            return Ok(());
        }

        let entries = cells
            .iter()
            .map(|at| {
                let delta_row = at.row as isize - first.row as isize;
                let delta_col = at.col as isize - first.col as isize;
                (*at, offset_formula_references(input, delta_row, delta_col))
            })
            .collect();
        self.install_all(entries);
        debug!(cells = cells.len(), input, "extended formula");
        Ok(())
    }
}
