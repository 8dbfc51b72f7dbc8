use sheetcalc_engine::engine::{
    CellContent, CellId, CellRef, FormulaError, ShiftOperation, shift_formula_references,
};
use std::collections::BTreeSet;
use tracing::debug;

use super::Sheet;
use crate::error::{Result, SheetError};

/// Dimension for row/column operations
#[derive(Copy, Clone, Debug)]
enum Dimension {
    Row,
    Column,
}

impl Dimension {
    fn insert_op(&self, at: usize) -> ShiftOperation {
        match self {
            Dimension::Row => ShiftOperation::InsertRow(at),
            Dimension::Column => ShiftOperation::InsertColumn(at),
        }
    }

    fn delete_op(&self, at: usize) -> ShiftOperation {
        match self {
            Dimension::Row => ShiftOperation::DeleteRow(at),
            Dimension::Column => ShiftOperation::DeleteColumn(at),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Dimension::Row => "row",
            Dimension::Column => "column",
        }
    }
}

impl Sheet {
    fn len_of(&self, dim: Dimension) -> usize {
        match dim {
            Dimension::Row => self.rows(),
            Dimension::Column => self.cols(),
        }
    }

    fn limit_of(&self, dim: Dimension) -> usize {
        match dim {
            Dimension::Row => self.config.max_rows,
            Dimension::Column => self.config.max_cols,
        }
    }

    /// Rewrite the stored input of every formula for a structural edit.
    /// Values are not recomputed here.
    fn rewrite_formulas(&mut self, op: ShiftOperation) -> usize {
        let mut rewritten = 0;
        for cell in self.cells.iter_mut().flatten() {
            if let CellContent::Formula(formula) = &mut cell.content {
                let shifted = shift_formula_references(&formula.input, op);
                if shifted != formula.input {
                    formula.input = shifted;
                    formula.invalidate();
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    fn insert_dimension(&mut self, dim: Dimension, at: usize) -> Result<()> {
        let len = self.len_of(dim);
        if at > len {
            return Err(SheetError::IndexOutOfRange { index: at, len });
        }
        let limit = self.limit_of(dim);
        if len + 1 > limit {
            return Err(SheetError::LimitReached { limit });
        }

        let rewritten = self.rewrite_formulas(dim.insert_op(at));

        match dim {
            Dimension::Row => {
                let cols = self.cols();
                let line = (0..cols)
                    .map(|col| self.fresh_cell(CellRef::new(at, col)))
                    .collect();
                self.cells.insert(at, line);
            }
            Dimension::Column => {
                for row in 0..self.rows() {
                    let cell = self.fresh_cell(CellRef::new(row, at));
                    self.cells[row].insert(at, cell);
                }
            }
        }
        self.reindex();
        self.update_values();

        debug!(dimension = dim.name(), at, rewritten, "inserted line");
        Ok(())
    }

    /// Turn every formula that reads a cell of the doomed line into `#REF!`,
    /// including ranges that only pass through it.
    fn break_readers_of_line(&mut self, dim: Dimension, at: usize) -> usize {
        let doomed: Vec<CellId> = match dim {
            Dimension::Row => self.cells[at].iter().map(|cell| cell.id).collect(),
            Dimension::Column => self.cells.iter().map(|line| line[at].id).collect(),
        };
        let mut readers = BTreeSet::new();
        for id in &doomed {
            readers.extend(self.references.dependents_of(*id));
        }

        let sentinel = FormulaError::StructuralReference.sentinel();
        for reader in &readers {
            self.references.erase_all_of(*reader);
            if let Some(pos) = self.position_of(*reader) {
                self.cell_mut(pos).content = CellContent::Literal(sentinel.to_string());
            }
        }
        readers.len()
    }

    fn delete_dimension(&mut self, dim: Dimension, at: usize) -> Result<()> {
        let len = self.len_of(dim);
        if at >= len {
            return Err(SheetError::IndexOutOfRange { index: at, len });
        }
        if len == 1 {
            return Err(SheetError::LastLine);
        }

        let broken = self.break_readers_of_line(dim, at);
        let rewritten = self.rewrite_formulas(dim.delete_op(at));

        let removed: Vec<_> = match dim {
            Dimension::Row => self.cells.remove(at),
            Dimension::Column => self.cells.iter_mut().map(|line| line.remove(at)).collect(),
        };
        for cell in &removed {
            self.references.remove_cell(cell.id);
        }
        self.reindex();
        self.update_values();

        debug!(
            dimension = dim.name(),
            at,
            rewritten,
            broken,
            removed = removed.len(),
            "deleted line"
        );
        Ok(())
    }

    /// Insert an empty row before `at` (`at == rows` appends).
    pub fn insert_row(&mut self, at: usize) -> Result<()> {
        self.insert_dimension(Dimension::Row, at)
    }

    /// Delete row `at`; formulas that read it display `#REF!`.
    pub fn delete_row(&mut self, at: usize) -> Result<()> {
        self.delete_dimension(Dimension::Row, at)
    }

    /// Insert an empty column before `at` (`at == cols` appends).
    pub fn insert_column(&mut self, at: usize) -> Result<()> {
        self.insert_dimension(Dimension::Column, at)
    }

    /// Delete column `at`; formulas that read it display `#REF!`.
    pub fn delete_column(&mut self, at: usize) -> Result<()> {
        self.delete_dimension(Dimension::Column, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetConfig;

    fn cell(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn small_sheet(rows: usize, cols: usize) -> Sheet {
        Sheet::with_config(SheetConfig {
            rows,
            cols,
            max_rows: 4,
            max_cols: 4,
        })
        .unwrap()
    }

    #[test]
    fn test_insert_row_shifts_cells_and_formulas() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("A0"), "2").unwrap();
        sheet.set_formula(cell("A1"), "4").unwrap();
        sheet.set_formula(cell("B0"), "=A0+A1").unwrap();

        sheet.insert_row(0).unwrap();
        assert_eq!(sheet.rows(), 27);
        assert_eq!(sheet.display(cell("A1")).unwrap(), "2");
        assert_eq!(sheet.input(cell("B1")).unwrap(), "=A1+A2");
        assert_eq!(sheet.display(cell("B1")).unwrap(), "6");
        assert_eq!(sheet.input(cell("B0")).unwrap(), "");

        sheet.set_formula(cell("A2"), "10").unwrap();
        assert_eq!(sheet.display(cell("B1")).unwrap(), "12");
    }

    #[test]
    fn test_insert_column_inside_range_grows_it() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("A0"), "1").unwrap();
        sheet.set_formula(cell("B0"), "3").unwrap();
        sheet.set_formula(cell("A1"), "=mean(A0:B0)").unwrap();
        sheet.insert_column(1).unwrap();
        assert_eq!(sheet.input(cell("A1")).unwrap(), "=mean(A0:C0)");
        // The new empty cell is not numeric.
        assert_eq!(sheet.display(cell("A1")).unwrap(), "#REF!");
        sheet.set_formula(cell("B0"), "5").unwrap();
        assert_eq!(sheet.display(cell("A1")).unwrap(), "3");
    }

    #[test]
    fn test_delete_referenced_row_gives_ref() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("A0"), "1").unwrap();
        sheet.set_formula(cell("A1"), "2").unwrap();
        sheet.set_formula(cell("B2"), "=A1*3").unwrap();
        sheet.set_formula(cell("C2"), "=absolute(A0)").unwrap();

        sheet.delete_row(1).unwrap();
        assert_eq!(sheet.display(cell("B1")).unwrap(), "#REF!");
        assert_eq!(sheet.input(cell("B1")).unwrap(), "#REF!");
        assert_eq!(sheet.display(cell("C1")).unwrap(), "1");
        assert_eq!(sheet.precedents(cell("B1")).unwrap(), Vec::<CellRef>::new());
        assert_eq!(sheet.reference_count(), 1);
    }

    #[test]
    fn test_delete_row_inside_range_gives_ref() {
        let mut sheet = Sheet::new();
        for (row, value) in ["2", "4", "6"].iter().enumerate() {
            sheet.set_formula(CellRef::new(row, 0), value).unwrap();
        }
        sheet.set_formula(cell("C0"), "=mean(A0:A2)").unwrap();
        sheet.set_formula(cell("D0"), "=A0+A2").unwrap();
        assert_eq!(sheet.dependents(cell("A1")).unwrap(), vec![cell("C0")]);

        sheet.delete_row(1).unwrap();
        assert_eq!(sheet.input(cell("C0")).unwrap(), "#REF!");
        assert_eq!(sheet.display(cell("C0")).unwrap(), "#REF!");
        assert_eq!(sheet.precedents(cell("C0")).unwrap(), Vec::<CellRef>::new());
        // D0 never read A1, so it only follows the shift.
        assert_eq!(sheet.input(cell("D0")).unwrap(), "=A0+A1");
        assert_eq!(sheet.display(cell("D0")).unwrap(), "8");
    }

    #[test]
    fn test_delete_column_inside_range_gives_ref() {
        let mut sheet = Sheet::new();
        for (col, value) in ["1", "2", "3"].iter().enumerate() {
            sheet.set_formula(CellRef::new(0, col), value).unwrap();
        }
        sheet.set_formula(cell("A2"), "=median(A0:C0)").unwrap();
        sheet.set_formula(cell("E2"), "=C0*2").unwrap();

        sheet.delete_column(1).unwrap();
        assert_eq!(sheet.display(cell("A2")).unwrap(), "#REF!");
        assert_eq!(sheet.input(cell("D2")).unwrap(), "=B0*2");
        assert_eq!(sheet.display(cell("D2")).unwrap(), "6");
        assert_eq!(sheet.reference_count(), 1);
    }

    #[test]
    fn test_delete_column_shifts_left() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("C0"), "7").unwrap();
        sheet.set_formula(cell("D0"), "=C0+1").unwrap();
        sheet.delete_column(0).unwrap();
        assert_eq!(sheet.cols(), 25);
        assert_eq!(sheet.input(cell("C0")).unwrap(), "=B0+1");
        assert_eq!(sheet.display(cell("C0")).unwrap(), "8");
        sheet.set_formula(cell("B0"), "9").unwrap();
        assert_eq!(sheet.display(cell("C0")).unwrap(), "10");
    }

    #[test]
    fn test_limits_and_indices() {
        let mut sheet = small_sheet(3, 1);
        assert!(matches!(
            sheet.insert_row(5),
            Err(SheetError::IndexOutOfRange { index: 5, len: 3 })
        ));
        sheet.insert_row(3).unwrap();
        assert!(matches!(sheet.insert_row(0), Err(SheetError::LimitReached { limit: 4 })));
        assert!(matches!(sheet.delete_column(0), Err(SheetError::LastLine)));
        assert!(matches!(
            sheet.delete_row(4),
            Err(SheetError::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_stored_coordinates_follow_edits() {
        let mut sheet = small_sheet(2, 2);
        sheet.set_formula(cell("B1"), "x").unwrap();
        sheet.insert_row(0).unwrap();
        sheet.insert_column(0).unwrap();
        let moved = sheet.get(cell("C2")).unwrap();
        assert_eq!(moved.at, cell("C2"));
        assert_eq!(moved.input(), "x");
    }
}
