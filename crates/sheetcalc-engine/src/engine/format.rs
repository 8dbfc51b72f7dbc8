use super::error::FormulaError;

/// Format a number for display.
///
/// Integral values print without a fraction (`4`, not `4.0`); everything else
/// uses the shortest representation that round-trips. Non-finite values are a
/// computation failure and display as `#NAME?`.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return FormulaError::ArityOrType.sentinel().to_string();
    }
    if n == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    format!("{}", n)
}

/// Parse a display string as a number the way formulas see it.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333333333");
        assert_eq!(format_number(f64::INFINITY), "#NAME?");
        assert_eq!(format_number(f64::NAN), "#NAME?");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number(" -2.5 "), Some(-2.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
