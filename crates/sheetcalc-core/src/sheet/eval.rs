use sheetcalc_engine::engine::{CellContent, CellId, CellRef, Formula, Outcome, parse};
use tracing::debug;

use super::Sheet;
use crate::error::Result;

impl Sheet {
    /// Set a cell from user input and recompute everything that reads it.
    pub fn set_formula(&mut self, at: CellRef, input: &str) -> Result<()> {
        self.check_bounds(at)?;
        self.install(at, input);
        let id = self.cell(at).id;
        self.propagate(&[id]);
        debug!(cell = %at, input, value = %self.cell(at).display(), "cell set");
        Ok(())
    }

    /// Displayed value of a cell.
    pub fn display(&self, at: CellRef) -> Result<String> {
        self.check_bounds(at)?;
        Ok(self.cell(at).display())
    }

    /// What the user typed into a cell.
    pub fn input(&self, at: CellRef) -> Result<String> {
        self.check_bounds(at)?;
        Ok(self.cell(at).input().to_string())
    }

    /// Recompute every formula in dependency order.
    pub fn update_values(&mut self) {
        let order = self.settle_order();
        debug!(formulas = order.len(), "settling sheet");
        self.recompute(&order);
    }

    /// Parse `input` into the cell at `at` and commit the references it read.
    /// Does not touch dependents.
    pub(crate) fn install(&mut self, at: CellRef, input: &str) {
        let id = self.cell(at).id;
        self.references.erase_all_of(id);

        let parsed = parse(input, at, &*self);
        let content = match parsed.outcome {
            Outcome::Literal(text) => CellContent::Literal(text),
            Outcome::Formula { function, body } => {
                for target in &parsed.references {
                    let target_id = self.cell(*target).id;
                    self.references.add(target_id, id);
                }
                let mut formula = Formula::new(function, input, body);
                formula.refresh();
                CellContent::Formula(formula)
            }
        };
        self.cell_mut(at).content = content;
    }

    /// Recompute every cell that transitively reads any of `changed`.
    pub(crate) fn propagate(&mut self, changed: &[CellId]) {
        let order = self.references.dependents_in_order(changed);
        if !order.is_empty() {
            debug!(changed = changed.len(), dependents = order.len(), "propagating");
        }
        self.recompute(&order);
    }

    /// Re-parse the given formula cells in order from their stored input.
    fn recompute(&mut self, order: &[CellId]) {
        for id in order {
            if let Some(formula) = self.position_of(*id).and_then(|at| self.cell_mut(at).formula_mut()) {
                formula.invalidate();
            }
        }
        for id in order {
            let Some(at) = self.position_of(*id) else {
                continue;
            };
            let input = match &self.cell(at).content {
                CellContent::Formula(formula) => formula.input.clone(),
                CellContent::Literal(_) => continue,
            };
            self.install(at, &input);
        }
    }

    /// Every formula cell, ordered so each comes after the cells it reads.
    fn settle_order(&self) -> Vec<CellId> {
        let mut order: Vec<CellId> = self
            .iter()
            .filter(|cell| cell.is_formula())
            .map(|cell| cell.id)
            .filter(|id| self.references.precedents_of(*id).next().is_none())
            .collect();
        order.extend(self.references.dependents_in_order(&self.references.roots()));
        order
    }
}
