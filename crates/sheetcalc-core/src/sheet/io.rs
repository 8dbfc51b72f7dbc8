//! The string-grid boundary: inputs in, display values out.

use sheetcalc_engine::engine::CellRef;
use tracing::debug;

use super::Sheet;
use crate::config::SheetConfig;
use crate::error::{Result, SheetError};

impl Sheet {
    /// Build a sheet from rows of user inputs, growing past the configured
    /// initial size when the data needs it.
    ///
    /// Formulas may read cells that appear later in the data, so they are
    /// installed repeatedly until their values stop changing.
    pub fn from_rows(config: SheetConfig, rows: &[Vec<String>]) -> Result<Sheet> {
        config.validate()?;
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if height > config.max_rows {
            return Err(SheetError::LimitReached { limit: config.max_rows });
        }
        if width > config.max_cols {
            return Err(SheetError::LimitReached { limit: config.max_cols });
        }

        let mut sheet = Sheet::with_config(SheetConfig {
            rows: config.rows.max(height),
            cols: config.cols.max(width),
            ..config
        })?;

        let mut formulas = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            for (col, input) in line.iter().enumerate() {
                let at = CellRef::new(row, col);
                if input.starts_with('=') {
                    formulas.push((at, input.as_str()));
                } else {
                    sheet.install(at, input);
                }
            }
        }

        let mut previous: Option<Vec<String>> = None;
        let mut passes = 0;
        for _ in 0..formulas.len().max(1) {
            passes += 1;
            for (at, input) in &formulas {
                sheet.install(*at, input);
            }
            let values: Vec<String> = formulas.iter().map(|(at, _)| sheet.cell(*at).display()).collect();
            if previous.as_ref() == Some(&values) {
                break;
            }
            previous = Some(values);
        }
        sheet.update_values();

        debug!(rows = height, cols = width, formulas = formulas.len(), passes, "loaded sheet");
        Ok(sheet)
    }

    /// Display values of the used area, row-major.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let (rows, cols) = self.used_area();
        (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| self.cell(CellRef::new(row, col)).display())
                    .collect()
            })
            .collect()
    }
}
