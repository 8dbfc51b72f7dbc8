//! The reference graph between cells.
//!
//! Edges run from a referenced cell to the cells that reference it, which is
//! the direction recomputation walks. The reverse index is kept alongside so
//! a formula's own references can be dropped before it is re-parsed.

use std::collections::{BTreeMap, BTreeSet};

use super::cell::CellId;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceGraph {
    /// referenced -> referencing
    dependents: BTreeMap<CellId, BTreeSet<CellId>>,
    /// referencing -> referenced
    precedents: BTreeMap<CellId, BTreeSet<CellId>>,
}

impl ReferenceGraph {
    pub fn new() -> ReferenceGraph {
        ReferenceGraph::default()
    }

    /// Record that `referencing` reads `referenced`. Self edges are refused.
    pub fn add(&mut self, referenced: CellId, referencing: CellId) -> bool {
        if referenced == referencing {
            return false;
        }
        self.dependents.entry(referenced).or_default().insert(referencing);
        self.precedents.entry(referencing).or_default().insert(referenced)
    }

    /// Drop every edge where `referencing` is the reading side.
    pub fn erase_all_of(&mut self, referencing: CellId) {
        let Some(referenced) = self.precedents.remove(&referencing) else {
            return;
        };
        for target in referenced {
            if let Some(set) = self.dependents.get_mut(&target) {
                set.remove(&referencing);
                if set.is_empty() {
                    self.dependents.remove(&target);
                }
            }
        }
    }

    /// Drop every edge touching `id`, in either direction.
    pub fn remove_cell(&mut self, id: CellId) {
        self.erase_all_of(id);
        if let Some(readers) = self.dependents.remove(&id) {
            for reader in readers {
                if let Some(set) = self.precedents.get_mut(&reader) {
                    set.remove(&id);
                    if set.is_empty() {
                        self.precedents.remove(&reader);
                    }
                }
            }
        }
    }

    pub fn dependents_of(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.dependents.get(&id).into_iter().flatten().copied()
    }

    pub fn precedents_of(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.precedents.get(&id).into_iter().flatten().copied()
    }

    pub fn has_dependents(&self, id: CellId) -> bool {
        self.dependents.contains_key(&id)
    }

    pub fn edge_count(&self) -> usize {
        self.precedents.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Cells referenced by others that reference nothing themselves.
    pub fn roots(&self) -> Vec<CellId> {
        self.dependents
            .keys()
            .filter(|id| !self.precedents.contains_key(id))
            .copied()
            .collect()
    }

    /// Whether `from` reaches `to` by following references backwards, i.e.
    /// whether `from` depends on `to` directly or transitively.
    pub fn depends_on(&self, from: CellId, to: CellId) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.precedents_of(current));
            }
        }
        false
    }

    /// Every cell that transitively reads any of `starts`, each listed once,
    /// ordered so a cell comes after everything it reads.
    pub fn dependents_in_order(&self, starts: &[CellId]) -> Vec<CellId> {
        let mut visited = BTreeSet::new();
        let mut post_order = Vec::new();

        for start in starts {
            for first in self.dependents_of(*start) {
                if visited.contains(&first) {
                    continue;
                }
                visited.insert(first);
                let mut stack: Vec<(CellId, Vec<CellId>)> =
                    vec![(first, self.dependents_of(first).collect())];
                while let Some((current, pending)) = stack.last_mut() {
                    let current = *current;
                    match pending.pop() {
                        Some(next) => {
                            if visited.insert(next) {
                                let children = self.dependents_of(next).collect();
                                stack.push((next, children));
                            }
                        }
                        None => {
                            post_order.push(current);
                            stack.pop();
                        }
                    }
                }
            }
        }

        post_order.reverse();
        post_order
    }
}
