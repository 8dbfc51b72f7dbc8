//! sheetcalc-core - The sheet model: grid, recompute, structural edits and block operations.

pub mod config;
pub mod error;
pub mod sheet;

pub use config::SheetConfig;
pub use error::{Result, SheetError};
pub use sheet::{Sheet, SortOrder};

pub use sheetcalc_engine::engine::CellRef;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn column_a(values: &[&str]) -> Sheet {
        let mut sheet = Sheet::new();
        for (row, value) in values.iter().enumerate() {
            sheet.set_formula(CellRef::new(row, 0), value).unwrap();
        }
        sheet
    }

    #[test]
    fn test_mean_of_column() {
        let mut sheet = column_a(&["2", "4", "6"]);
        sheet.set_formula(cell("C0"), "=mean(A0:A2)").unwrap();
        assert_eq!(sheet.display(cell("C0")).unwrap(), "4");
    }

    #[test]
    fn test_edit_recomputes_reader() {
        let mut sheet = column_a(&["2", "4", "6"]);
        sheet.set_formula(cell("C0"), "=mean(A0:A2)").unwrap();
        sheet.set_formula(cell("A1"), "10").unwrap();
        assert_eq!(sheet.display(cell("C0")).unwrap(), "6");
    }

    #[test]
    fn test_sort_is_numeric_not_lexicographic() {
        let mut sheet = column_a(&["10", "2", "1"]);
        let column: Vec<CellRef> = (0..3).map(|row| CellRef::new(row, 0)).collect();
        sheet.sort_block(&column, SortOrder::Ascending).unwrap();
        assert_eq!(sheet.to_rows(), vec![vec!["1"], vec!["2"], vec!["10"]]);
    }

    #[test]
    fn test_arithmetic_has_no_precedence() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("A1"), "3").unwrap();
        sheet.set_formula(cell("B1"), "4").unwrap();
        sheet.set_formula(cell("C1"), "=A1+B1*2").unwrap();
        assert_eq!(sheet.display(cell("C1")).unwrap(), "14");
    }

    #[test]
    fn test_insert_row_substitutes_coordinates() {
        let mut sheet = column_a(&["2", "3"]);
        sheet.set_formula(cell("B2"), "=A0*A1").unwrap();
        sheet.set_formula(cell("C2"), "=mean(A0:A1)").unwrap();
        sheet.set_formula(cell("D2"), "=replaceText([A0 stays];[A0];B2)").unwrap();

        sheet.insert_row(0).unwrap();
        assert_eq!(sheet.input(cell("B3")).unwrap(), "=A1*A2");
        assert_eq!(sheet.input(cell("C3")).unwrap(), "=mean(A1:A2)");
        assert_eq!(sheet.input(cell("D3")).unwrap(), "=replaceText([A0 stays];[A0];B3)");
        assert_eq!(sheet.display(cell("B3")).unwrap(), "6");
        assert_eq!(sheet.display(cell("C3")).unwrap(), "2.5");
        assert_eq!(sheet.display(cell("D3")).unwrap(), "6 stays");
    }

    #[test]
    fn test_cycles_are_rejected_without_edges() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("A0"), "=A0+1").unwrap();
        assert_eq!(sheet.display(cell("A0")).unwrap(), "#REF!");
        assert_eq!(sheet.reference_count(), 0);

        sheet.set_formula(cell("B0"), "1").unwrap();
        sheet.set_formula(cell("C0"), "=B0+1").unwrap();
        sheet.set_formula(cell("D0"), "=C0+1").unwrap();
        assert_eq!(sheet.reference_count(), 2);
        sheet.set_formula(cell("B0"), "=D0+1").unwrap();
        assert_eq!(sheet.display(cell("B0")).unwrap(), "#REF!");
        assert_eq!(sheet.precedents(cell("B0")).unwrap(), Vec::<CellRef>::new());
    }

    #[test]
    fn test_deleting_referenced_column() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("A0"), "5").unwrap();
        sheet.set_formula(cell("B0"), "=absolute(A0)").unwrap();
        sheet.delete_column(0).unwrap();
        assert_eq!(sheet.display(cell("A0")).unwrap(), "#REF!");
    }

    #[test]
    fn test_chain_of_readers_recomputes() {
        let mut sheet = Sheet::new();
        sheet.set_formula(cell("A0"), "1").unwrap();
        for row in 1..6 {
            let input = format!("=A{}+1", row - 1);
            sheet.set_formula(CellRef::new(row, 0), &input).unwrap();
        }
        sheet.set_formula(cell("B0"), "=mean(A0:A5)").unwrap();
        sheet.set_formula(cell("A0"), "11").unwrap();
        let column: Vec<String> = (0..6)
            .map(|row| sheet.display(CellRef::new(row, 0)).unwrap())
            .collect();
        assert_eq!(column, vec!["11", "12", "13", "14", "15", "16"]);
        assert_eq!(sheet.display(cell("B0")).unwrap(), "13.5");
    }

    #[test]
    fn test_literals_read_back_unchanged() {
        let mut sheet = Sheet::new();
        for (i, text) in ["", "plain", "  spaced  ", "#REF!", "12.50", "=", "+1"].iter().enumerate() {
            let at = CellRef::new(i, i);
            sheet.set_formula(at, text).unwrap();
            if !text.starts_with('=') {
                assert_eq!(sheet.display(at).unwrap(), *text);
                assert_eq!(sheet.input(at).unwrap(), *text);
            }
        }
        assert_eq!(sheet.display(CellRef::new(5, 5)).unwrap(), "#ERROR");
    }
}
