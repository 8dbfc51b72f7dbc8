//! sheetcalc_engine - Formula parsing, built-in functions and the reference graph.

pub mod builtins;
pub mod engine;
