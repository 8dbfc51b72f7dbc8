//! The sheet model: a grid of cells plus the references between them.

mod block;
mod eval;
mod io;
mod natural_order;
mod ops;
mod state;

pub use block::SortOrder;
pub use natural_order::{compare_values, natural_cmp};
pub use state::Sheet;
