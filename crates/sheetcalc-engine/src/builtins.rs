//! Built-in sheet functions and their registry.
//!
//! Conventions:
//! - Sheet-facing names start with a lower-case letter (e.g. `mean`,
//!   `dayOfWeek`); that is how the parser tells a call from arithmetic.
//! - Every function has a fixed arity and works only on resolved
//!   [`Parameter`]s. Any failure inside a function becomes `#NAME?`.
//! - If you add a function, add a [`Function`] variant, list it in
//!   `BUILTINS` and give it an arm in [`Function::evaluate`].

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::{FormulaError, Parameter, format_number};

/// The closed set of functions a formula cell can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Absolute,
    Covariance,
    DayOfWeek,
    ElementExtraction,
    Floor,
    Identity,
    Increment,
    LengthText,
    Mean,
    Median,
    Pearson,
    ReplaceText,
    StandardDeviation,
    Truncate,
    Variance,
}

pub struct Builtin {
    pub name: &'static str,
    pub function: Function,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "absolute",
        function: Function::Absolute,
        description: "Absolute value of a number",
    },
    Builtin {
        name: "covariance",
        function: Function::Covariance,
        description: "Population covariance of two equal-length vectors",
    },
    Builtin {
        name: "dayOfWeek",
        function: Function::DayOfWeek,
        description: "Weekday name of a dd/MM/yyyy date",
    },
    Builtin {
        name: "elementExtraction",
        function: Function::ElementExtraction,
        description: "Day, month or year part of a date",
    },
    Builtin {
        name: "floor",
        function: Function::Floor,
        description: "Largest integer not greater than a number",
    },
    Builtin {
        name: "identity",
        function: Function::Identity,
        description: "Returns its argument unchanged",
    },
    Builtin {
        name: "increment",
        function: Function::Increment,
        description: "Adds one to a number",
    },
    Builtin {
        name: "lengthText",
        function: Function::LengthText,
        description: "Number of characters in a text",
    },
    Builtin {
        name: "mean",
        function: Function::Mean,
        description: "Arithmetic mean of a vector",
    },
    Builtin {
        name: "median",
        function: Function::Median,
        description: "Median of a vector",
    },
    Builtin {
        name: "pearson",
        function: Function::Pearson,
        description: "Pearson correlation of two equal-length vectors",
    },
    Builtin {
        name: "replaceText",
        function: Function::ReplaceText,
        description: "Replace every match of a pattern in a text",
    },
    Builtin {
        name: "standardDeviation",
        function: Function::StandardDeviation,
        description: "Population or sample standard deviation of a vector",
    },
    Builtin {
        name: "standard",
        function: Function::StandardDeviation,
        description: "Short name of standardDeviation",
    },
    Builtin {
        name: "truncate",
        function: Function::Truncate,
        description: "Drop decimals beyond a given position",
    },
    Builtin {
        name: "variance",
        function: Function::Variance,
        description: "Population or sample variance of a vector",
    },
];

/// Look a function up by its sheet-facing name.
pub fn lookup(name: &str) -> Option<Function> {
    BUILTINS.iter().find(|b| b.name == name).map(|b| b.function)
}

impl Function {
    /// Sheet-facing name (the first registered one).
    pub fn name(&self) -> &'static str {
        BUILTINS
            .iter()
            .find(|b| b.function == *self)
            .map(|b| b.name)
            .unwrap_or("identity")
    }

    /// Number of arguments the function takes.
    pub fn arity(&self) -> usize {
        match self {
            Function::Absolute
            | Function::DayOfWeek
            | Function::Floor
            | Function::Identity
            | Function::Increment
            | Function::LengthText
            | Function::Mean
            | Function::Median => 1,
            Function::Covariance
            | Function::ElementExtraction
            | Function::Pearson
            | Function::StandardDeviation
            | Function::Truncate
            | Function::Variance => 2,
            Function::ReplaceText => 3,
        }
    }

    /// Run the function. Failures come back as the `#NAME?` sentinel.
    pub fn evaluate(&self, params: &[Parameter]) -> String {
        if params.len() != self.arity() {
            return name_error();
        }
        let result = match self {
            Function::Identity => identity(&params[0]),
            Function::Absolute => params[0].as_scalar().map(|n| format_number(n.abs())),
            Function::Floor => params[0].as_scalar().map(|n| format_number(n.floor())),
            Function::Increment => params[0].as_scalar().map(increment),
            Function::Truncate => truncate(&params[0], &params[1]),
            Function::LengthText => params[0].as_text().map(|s| s.chars().count().to_string()),
            Function::ReplaceText => replace_text(&params[0], &params[1], &params[2]),
            Function::Mean => params[0].as_vector().and_then(|v| mean(&v)).map(format_number),
            Function::Median => params[0].as_vector().and_then(median).map(format_number),
            Function::Variance => spread(&params[0], &params[1]).map(format_number),
            Function::StandardDeviation => {
                spread(&params[0], &params[1]).map(|var| format_number(var.sqrt()))
            }
            Function::Covariance => paired(&params[0], &params[1])
                .and_then(|(x, y)| covariance(&x, &y))
                .map(format_number),
            Function::Pearson => paired(&params[0], &params[1])
                .and_then(|(x, y)| pearson(&x, &y))
                .map(format_number),
            Function::DayOfWeek => params[0].as_text().and_then(day_of_week),
            Function::ElementExtraction => match (params[0].as_text(), params[1].as_text()) {
                (Some(part), Some(date)) => element_extraction(part, date),
                _ => None,
            },
        };
        result.unwrap_or_else(name_error)
    }
}

fn name_error() -> String {
    FormulaError::ArityOrType.sentinel().to_string()
}

fn identity(param: &Parameter) -> Option<String> {
    match param {
        Parameter::Text(s) => Some(s.clone()),
        Parameter::Scalar(n) => Some(format_number(*n)),
        Parameter::Vector(_) => None,
    }
}

/// Split the shortest decimal form of `n` into an integer mantissa and scale.
fn decimal_parts(n: f64) -> Option<(i128, u32)> {
    let text = format!("{}", n);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let scale = u32::try_from(frac_part.len()).ok()?;
    let digits = format!("{}{}", int_part, frac_part);
    Some((digits.parse::<i128>().ok()?, scale))
}

fn decimal_string(mantissa: i128, scale: u32) -> String {
    if scale == 0 {
        return mantissa.to_string();
    }
    let sign = if mantissa < 0 { "-" } else { "" };
    let digits = format!("{:0>width$}", mantissa.unsigned_abs(), width = scale as usize + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - scale as usize);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        format!("{}{}", sign, int_part)
    } else {
        format!("{}{}.{}", sign, int_part, frac_part)
    }
}

fn increment(n: f64) -> String {
    if n >= 0.0 {
        return format_number(n + 1.0);
    }
    // Negative inputs add exactly so -0.1 becomes 0.9, not 0.9000000000000000222.
    match decimal_parts(n) {
        Some((mantissa, scale)) => match 10i128
            .checked_pow(scale)
            .and_then(|one| mantissa.checked_add(one))
        {
            Some(sum) if sum == 0 => "0".to_string(),
            Some(sum) => decimal_string(sum, scale),
            None => format_number(n + 1.0),
        },
        None => format_number(n + 1.0),
    }
}

fn truncate(value: &Parameter, places: &Parameter) -> Option<String> {
    let value = value.as_scalar()?;
    let places = places.as_scalar()?.trunc();
    if !value.is_finite() || !places.is_finite() {
        return None;
    }

    if places < 0.0 {
        let factor = 10f64.powi(i32::try_from(-places as i64).ok()?);
        return Some(format_number((value / factor).trunc() * factor));
    }

    let (mantissa, scale) = decimal_parts(value)?;
    let keep = (places as u32).min(scale);
    let divisor = 10i128.checked_pow(scale - keep)?;
    // Integer division truncates toward zero: floor for positives, ceiling for negatives.
    let kept = mantissa / divisor;
    if kept == 0 {
        return Some("0".to_string());
    }
    Some(decimal_string(kept, keep))
}

fn replace_text(text: &Parameter, pattern: &Parameter, replacement: &Parameter) -> Option<String> {
    let text = text.to_text_lossy()?;
    let pattern = pattern.to_text_lossy()?;
    let replacement = replacement.to_text_lossy()?;
    let re = Regex::new(&pattern).ok()?;
    Some(re.replace_all(&text, replacement.as_str()).into_owned())
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Variance of `values` in the given `population`/`sample` mode.
fn spread(mode: &Parameter, values: &Parameter) -> Option<f64> {
    let values = values.as_vector()?;
    let m = mean(&values)?;
    let squares: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    let n = values.len() as f64;
    let divisor = match mode.as_text()? {
        "population" => n,
        "sample" => n - 1.0,
        _ => return None,
    };
    Some(squares / divisor)
}

fn paired(x: &Parameter, y: &Parameter) -> Option<(Vec<f64>, Vec<f64>)> {
    let x = x.as_vector()?;
    let y = y.as_vector()?;
    (x.len() == y.len()).then_some((x, y))
}

fn covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    let mx = mean(x)?;
    let my = mean(y)?;
    let sum: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    Some(sum / x.len() as f64)
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut cross = 0.0;
    let mut x_squares = 0.0;
    let mut y_squares = 0.0;
    for (a, b) in x.iter().zip(y) {
        cross += (a - mx) * (b - my);
        x_squares += (a - mx) * (a - mx);
        y_squares += (b - my) * (b - my);
    }
    if x_squares == 0.0 || y_squares == 0.0 {
        return None;
    }
    Some(cross / (x_squares * y_squares).sqrt())
}

fn day_of_week(date: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(date, "%d/%m/%Y").ok()?;
    Some(date.format("%A").to_string())
}

fn element_extraction(part: &str, date: &str) -> Option<String> {
    let mut pieces = date.splitn(3, ['/', '-']);
    let day = pieces.next()?;
    let month = pieces.next()?;
    let year = pieces.next()?;
    let picked = match part {
        "day" => day,
        "month" => month,
        "year" => year,
        _ => return None,
    };
    Some(picked.to_string())
}
