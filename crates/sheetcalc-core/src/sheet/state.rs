use sheetcalc_engine::engine::{Cell, CellId, CellRef, CellSource, ReferenceGraph, creates_cycle};
use std::collections::HashMap;

use crate::config::SheetConfig;
use crate::error::{Result, SheetError};

/// A single sheet: a rectangular grid of cells and the references between them.
///
/// Every public operation runs to completion before returning and leaves
/// every formula's cached value fresh. The sheet is not synchronized; callers
/// sharing one across threads must wrap it in their own lock.
#[derive(Clone, Debug)]
pub struct Sheet {
    /// Row-major grid; every row has the same length.
    pub(crate) cells: Vec<Vec<Cell>>,
    /// Edges between cell identities (referenced -> referencing).
    pub(crate) references: ReferenceGraph,
    /// Current coordinate of every live cell identity.
    pub(crate) positions: HashMap<CellId, CellRef>,
    next_id: u32,
    pub(crate) config: SheetConfig,
}

impl Default for Sheet {
    fn default() -> Self {
        Sheet::new()
    }
}

impl Sheet {
    /// A sheet with the default size (26x26, growable to 255x255).
    pub fn new() -> Self {
        Sheet::build(SheetConfig::default())
    }

    pub fn with_config(config: SheetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Sheet::build(config))
    }

    fn build(config: SheetConfig) -> Self {
        let mut sheet = Sheet {
            cells: Vec::with_capacity(config.rows),
            references: ReferenceGraph::new(),
            positions: HashMap::new(),
            next_id: 0,
            config,
        };
        for row in 0..config.rows {
            let line = (0..config.cols)
                .map(|col| sheet.fresh_cell(CellRef::new(row, col)))
                .collect();
            sheet.cells.push(line);
        }
        sheet.reindex();
        sheet
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    /// Current (rows, columns).
    pub fn dimensions(&self) -> (usize, usize) {
        let rows = self.cells.len();
        let cols = self.cells.first().map_or(0, Vec::len);
        (rows, cols)
    }

    pub fn rows(&self) -> usize {
        self.dimensions().0
    }

    pub fn cols(&self) -> usize {
        self.dimensions().1
    }

    pub(crate) fn fresh_cell(&mut self, at: CellRef) -> Cell {
        let id = CellId(self.next_id);
        self.next_id += 1;
        Cell::new_empty(id, at)
    }

    pub(crate) fn check_bounds(&self, at: CellRef) -> Result<()> {
        let (rows, cols) = self.dimensions();
        if at.row >= rows || at.col >= cols {
            return Err(SheetError::OutOfBounds {
                row: at.row,
                col: at.col,
            });
        }
        Ok(())
    }

    pub(crate) fn check_all_bounds(&self, cells: &[CellRef]) -> Result<()> {
        cells.iter().try_for_each(|at| self.check_bounds(*at))
    }

    /// The cell at `at`. Callers check bounds first.
    pub(crate) fn cell(&self, at: CellRef) -> &Cell {
        &self.cells[at.row][at.col]
    }

    pub(crate) fn cell_mut(&mut self, at: CellRef) -> &mut Cell {
        &mut self.cells[at.row][at.col]
    }

    pub fn get(&self, at: CellRef) -> Option<&Cell> {
        self.cells.get(at.row).and_then(|line| line.get(at.col))
    }

    pub(crate) fn position_of(&self, id: CellId) -> Option<CellRef> {
        self.positions.get(&id).copied()
    }

    /// Rebuild stored coordinates and the identity index after the grid shape changed.
    pub(crate) fn reindex(&mut self) {
        self.positions.clear();
        for (row, line) in self.cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                cell.at = CellRef::new(row, col);
                self.positions.insert(cell.id, cell.at);
            }
        }
    }

    /// Every cell, row-major.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    /// Smallest (rows, columns) rectangle from A0 holding every non-empty cell.
    pub fn used_area(&self) -> (usize, usize) {
        self.iter()
            .filter(|cell| !cell.is_empty())
            .fold((0, 0), |(rows, cols), cell| {
                (rows.max(cell.at.row + 1), cols.max(cell.at.col + 1))
            })
    }

    /// Number of reference edges.
    pub fn reference_count(&self) -> usize {
        self.references.edge_count()
    }

    /// Cells the formula at `at` reads, in row-major order.
    pub fn precedents(&self, at: CellRef) -> Result<Vec<CellRef>> {
        self.check_bounds(at)?;
        let mut cells: Vec<CellRef> = self
            .references
            .precedents_of(self.cell(at).id)
            .filter_map(|id| self.position_of(id))
            .collect();
        cells.sort();
        Ok(cells)
    }

    /// Cells whose formulas read `at` directly, in row-major order.
    pub fn dependents(&self, at: CellRef) -> Result<Vec<CellRef>> {
        self.check_bounds(at)?;
        let mut cells: Vec<CellRef> = self
            .references
            .dependents_of(self.cell(at).id)
            .filter_map(|id| self.position_of(id))
            .collect();
        cells.sort();
        Ok(cells)
    }
}

impl CellSource for Sheet {
    fn dimensions(&self) -> (usize, usize) {
        Sheet::dimensions(self)
    }

    fn may_reference(&self, formula_cell: CellRef, target: CellRef) -> bool {
        match (self.get(formula_cell), self.get(target)) {
            (Some(formula), Some(target)) => !creates_cycle(&self.references, formula.id, target.id),
            _ => false,
        }
    }

    fn value_at(&self, target: CellRef) -> String {
        self.get(target).map(Cell::display).unwrap_or_default()
    }
}
