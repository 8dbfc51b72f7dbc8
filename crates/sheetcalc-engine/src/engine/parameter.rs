//! Resolved function arguments.
//!
//! The parser turns every argument of a function call into a [`Parameter`]
//! before the function ever runs, so functions never look at the grid.

use serde::{Deserialize, Serialize};

use super::format::format_number;

/// A resolved argument: a number, a vector of numbers, or text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    Scalar(f64),
    Vector(Vec<f64>),
    Text(String),
}

impl Parameter {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Parameter::Scalar(n) => Some(*n),
            _ => None,
        }
    }

    /// Vector view of the argument; a lone scalar is coerced to one element.
    pub fn as_vector(&self) -> Option<Vec<f64>> {
        match self {
            Parameter::Scalar(n) => Some(vec![*n]),
            Parameter::Vector(v) => Some(v.clone()),
            Parameter::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Parameter::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text view that formats numbers instead of refusing them.
    pub fn to_text_lossy(&self) -> Option<String> {
        match self {
            Parameter::Text(s) => Some(s.clone()),
            Parameter::Scalar(n) => Some(format_number(*n)),
            Parameter::Vector(_) => None,
        }
    }
}
