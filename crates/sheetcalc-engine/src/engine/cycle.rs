//! Circular reference detection for formula cells.
//!
//! Before a reference is accepted we check that it cannot close a loop:
//! the target must not be the formula's own cell, and the target must not
//! already depend on the formula cell through any chain of references.

use super::cell::CellId;
use super::references::ReferenceGraph;

/// Whether letting `formula_cell` read `target` would create a cycle.
pub fn creates_cycle(graph: &ReferenceGraph, formula_cell: CellId, target: CellId) -> bool {
    formula_cell == target || graph.depends_on(target, formula_cell)
}
