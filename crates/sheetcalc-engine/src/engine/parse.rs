//! Formula tokenizer and parser.
//!
//! Turns the text a user typed into a cell into one of:
//!
//! - a literal (anything not starting with `=`, or an input so broken that
//!   only its error sentinel is kept),
//! - a formula: the [`Function`] to run plus its resolved [`Parameter`]s, or
//!   the [`FormulaError`] that stopped resolution.
//!
//! Two grammars exist after the `=`:
//!
//! - `name(arg;arg;...)` when the first character is a lower-case letter.
//!   Arguments are `[text]`, numbers, references (`B2`), ranges (`A0:C4`) or
//!   `,`-separated vectors of numbers, references and ranges.
//! - Arithmetic otherwise: operands joined by `+ - * /`, evaluated strictly
//!   left to right with no precedence. A lone non-numeric operand is treated
//!   as `identity` of its text.
//!
//! The parser reads the grid only through [`CellSource`] and reports which
//! cells it read; committing those as reference edges is the caller's job.

use tracing::trace;

use super::cell_ref::CellRef;
use super::error::FormulaError;
use super::format::parse_number;
use super::parameter::Parameter;
use crate::builtins::{Function, lookup};

/// Read access to the grid a formula is parsed against.
pub trait CellSource {
    /// Current (rows, columns) of the grid.
    fn dimensions(&self) -> (usize, usize);

    /// Whether the cell at `formula_cell` may read `target` without
    /// referencing itself or closing a cycle.
    fn may_reference(&self, formula_cell: CellRef, target: CellRef) -> bool;

    /// Display value of an in-bounds cell.
    fn value_at(&self, target: CellRef) -> String;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Literal(String),
    Formula {
        function: Function,
        body: Result<Vec<Parameter>, FormulaError>,
    },
}

/// Result of parsing one input: what to store, and which cells it read.
#[derive(Clone, Debug, PartialEq)]
pub struct Parsed {
    pub outcome: Outcome,
    pub references: Vec<CellRef>,
}

impl Parsed {
    fn literal(text: &str) -> Parsed {
        Parsed {
            outcome: Outcome::Literal(text.to_string()),
            references: Vec::new(),
        }
    }

    fn collapsed(error: FormulaError) -> Parsed {
        Parsed::literal(error.sentinel())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Sub => lhs - rhs,
            Operator::Mul => lhs * rhs,
            Operator::Div => lhs / rhs,
        }
    }
}

/// One argument of a function call.
#[derive(Clone, Debug, PartialEq)]
enum Token {
    Text(String),
    Number(f64),
    Reference(CellRef),
    Range(CellRef, CellRef),
    Vector(Vec<Token>),
}

/// Parse `input` as typed into the cell at `at`.
pub fn parse<S: CellSource + ?Sized>(input: &str, at: CellRef, source: &S) -> Parsed {
    let Some(rest) = input.strip_prefix('=') else {
        return Parsed::literal(input);
    };
    if rest.is_empty() {
        return Parsed::collapsed(FormulaError::Empty);
    }

    let body = strip_spaces(rest);
    if body.is_empty() {
        return Parsed::collapsed(FormulaError::Reference);
    }
    if body.contains(FormulaError::StructuralReference.sentinel()) {
        trace!(%at, input, "formula reads a deleted row or column");
        return Parsed::collapsed(FormulaError::StructuralReference);
    }

    let mut resolver = Resolver {
        at,
        source,
        references: Vec::new(),
    };
    let outcome = if body.starts_with(|c: char| c.is_ascii_lowercase()) {
        match parse_call(&body, &mut resolver) {
            Some(outcome) => outcome,
            None => {
                trace!(%at, input, "unknown function");
                return Parsed::collapsed(FormulaError::UnknownFunction);
            }
        }
    } else {
        match parse_arithmetic(&body, &mut resolver) {
            Ok(outcome) => outcome,
            Err(error) => {
                trace!(%at, input, %error, "arithmetic collapsed to literal");
                return Parsed::collapsed(error);
            }
        }
    };

    trace!(%at, input, references = resolver.references.len(), "parsed formula");
    Parsed {
        outcome,
        references: resolver.references,
    }
}

/// Remove spaces outside `[...]` text arguments.
pub fn strip_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_text = false;
    for c in text.chars() {
        match c {
            '[' => in_text = true,
            ']' => in_text = false,
            ' ' if !in_text => continue,
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Parse the call form. None means the name is missing or unregistered.
fn parse_call<S: CellSource + ?Sized>(body: &str, resolver: &mut Resolver<'_, S>) -> Option<Outcome> {
    let (name, rest) = body.split_once('(')?;
    let function = lookup(name)?;
    let formula = |body| Outcome::Formula { function, body };

    let Some(inner) = rest.strip_suffix(')') else {
        return Some(formula(Err(FormulaError::ArityOrType)));
    };
    let tokens = match tokenize_arguments(inner) {
        Ok(tokens) if !tokens.is_empty() => tokens,
        Ok(_) => return Some(formula(Err(FormulaError::ArityOrType))),
        Err(error) => return Some(formula(Err(error))),
    };

    let mut params = Vec::with_capacity(tokens.len());
    let mut non_numeric = false;
    for token in tokens {
        match resolver.argument(token) {
            Ok(Some(param)) => params.push(param),
            Ok(None) => non_numeric = true,
            Err(error) => return Some(formula(Err(error))),
        }
    }
    if non_numeric {
        return Some(formula(Err(FormulaError::Reference)));
    }
    Some(formula(Ok(params)))
}

fn parse_arithmetic<S: CellSource + ?Sized>(
    body: &str,
    resolver: &mut Resolver<'_, S>,
) -> Result<Outcome, FormulaError> {
    let (operands, operators) = tokenize_expression(body);
    let has_operator = !operators.is_empty();

    let mut acc = 0.0;
    for (i, operand) in operands.iter().enumerate() {
        if operand.is_empty() {
            return Err(FormulaError::Reference);
        }
        let value = if operand.starts_with(|c: char| c.is_ascii_uppercase()) {
            let cell = CellRef::from_str(operand).ok_or(FormulaError::Reference)?;
            resolver.reference(cell)?
        } else {
            operand.to_string()
        };

        match parse_number(&value) {
            Some(n) if i == 0 => acc = n,
            Some(n) => acc = operators[i - 1].apply(acc, n),
            None if has_operator => return Err(FormulaError::Reference),
            None => {
                return Ok(Outcome::Formula {
                    function: Function::Identity,
                    body: Ok(vec![Parameter::Text(value)]),
                });
            }
        }
    }

    Ok(Outcome::Formula {
        function: Function::Identity,
        body: Ok(vec![Parameter::Scalar(acc)]),
    })
}

/// Split an arithmetic body into operands and the operators between them.
fn tokenize_expression(body: &str) -> (Vec<&str>, Vec<Operator>) {
    let mut operands = Vec::new();
    let mut operators = Vec::new();
    let mut start = 0;
    for (i, c) in body.char_indices() {
        if let Some(op) = Operator::from_char(c) {
            operands.push(&body[start..i]);
            operators.push(op);
            start = i + c.len_utf8();
        }
    }
    operands.push(&body[start..]);
    (operands, operators)
}

/// Split the text between the parentheses of a call into argument tokens.
/// Empty arguments are skipped.
fn tokenize_arguments(inner: &str) -> Result<Vec<Token>, FormulaError> {
    split_arguments(inner)?
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .map(classify_argument)
        .collect()
}

/// Split on `;` outside `[...]`.
fn split_arguments(inner: &str) -> Result<Vec<&str>, FormulaError> {
    let mut pieces = Vec::new();
    let mut in_text = false;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '[' if !in_text => in_text = true,
            ']' if in_text => in_text = false,
            ';' if !in_text => {
                pieces.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_text {
        return Err(FormulaError::ArityOrType);
    }
    pieces.push(&inner[start..]);
    Ok(pieces)
}

fn classify_argument(piece: &str) -> Result<Token, FormulaError> {
    if let Some(text) = piece.strip_prefix('[') {
        return match text.strip_suffix(']') {
            Some(text) if !text.contains(']') => Ok(Token::Text(text.to_string())),
            _ => Err(FormulaError::ArityOrType),
        };
    }
    if piece.contains(['[', ']', '(', ')']) {
        return Err(FormulaError::ArityOrType);
    }
    if piece.contains(',') {
        let elements = piece
            .split(',')
            .map(classify_element)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Token::Vector(elements));
    }
    classify_element(piece)
}

fn classify_element(piece: &str) -> Result<Token, FormulaError> {
    if let Some((first, second)) = piece.split_once(':') {
        return match (CellRef::from_str(first), CellRef::from_str(second)) {
            (Some(a), Some(b)) => Ok(Token::Range(a, b)),
            _ => Err(FormulaError::Reference),
        };
    }
    if piece.starts_with(|c: char| c.is_ascii_uppercase()) {
        return CellRef::from_str(piece)
            .map(Token::Reference)
            .ok_or(FormulaError::Reference);
    }
    parse_number(piece)
        .map(Token::Number)
        .ok_or(FormulaError::ArityOrType)
}

/// Resolves references against the grid and remembers every cell read.
struct Resolver<'a, S: ?Sized> {
    at: CellRef,
    source: &'a S,
    references: Vec<CellRef>,
}

impl<S: CellSource + ?Sized> Resolver<'_, S> {
    fn in_bounds(&self, cell: CellRef) -> bool {
        let (rows, cols) = self.source.dimensions();
        cell.row < rows && cell.col < cols
    }

    fn reference(&mut self, cell: CellRef) -> Result<String, FormulaError> {
        if !self.in_bounds(cell) || !self.source.may_reference(self.at, cell) {
            return Err(FormulaError::Reference);
        }
        if !self.references.contains(&cell) {
            self.references.push(cell);
        }
        Ok(self.source.value_at(cell))
    }

    /// Values of the rectangle spanned by two corners, row-major from its
    /// top-left corner.
    fn range(&mut self, a: CellRef, b: CellRef) -> Result<Vec<String>, FormulaError> {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return Err(FormulaError::Reference);
        }
        let mut values = Vec::new();
        for row in a.row.min(b.row)..=a.row.max(b.row) {
            for col in a.col.min(b.col)..=a.col.max(b.col) {
                values.push(self.reference(CellRef::new(row, col))?);
            }
        }
        Ok(values)
    }

    /// Resolve one argument. `Ok(None)` means a vector held a non-numeric value.
    fn argument(&mut self, token: Token) -> Result<Option<Parameter>, FormulaError> {
        match token {
            Token::Text(text) => Ok(Some(Parameter::Text(text))),
            Token::Number(n) => Ok(Some(Parameter::Scalar(n))),
            Token::Reference(cell) => {
                let value = self.reference(cell)?;
                Ok(Some(match parse_number(&value) {
                    Some(n) => Parameter::Scalar(n),
                    None => Parameter::Text(value),
                }))
            }
            Token::Range(a, b) => {
                let values = self.range(a, b)?;
                Ok(numbers(&values).map(Parameter::Vector))
            }
            Token::Vector(elements) => {
                let mut all = Vec::new();
                let mut numeric = true;
                for element in elements {
                    let values = match element {
                        Token::Number(n) => {
                            all.push(n);
                            continue;
                        }
                        Token::Reference(cell) => vec![self.reference(cell)?],
                        Token::Range(a, b) => self.range(a, b)?,
                        Token::Text(_) | Token::Vector(_) => return Err(FormulaError::ArityOrType),
                    };
                    match numbers(&values) {
                        Some(found) => all.extend(found),
                        None => numeric = false,
                    }
                }
                Ok(numeric.then_some(Parameter::Vector(all)))
            }
        }
    }
}

fn numbers(values: &[String]) -> Option<Vec<f64>> {
    values.iter().map(|v| parse_number(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct TestGrid {
        values: HashMap<CellRef, String>,
        /// (formula cell, target) pairs that would close a cycle
        cycles: HashSet<(CellRef, CellRef)>,
    }

    impl TestGrid {
        fn with(cells: &[(&str, &str)]) -> TestGrid {
            let mut grid = TestGrid::default();
            for (name, value) in cells {
                grid.values.insert(cell(name), value.to_string());
            }
            grid
        }
    }

    impl CellSource for TestGrid {
        fn dimensions(&self) -> (usize, usize) {
            (10, 5)
        }

        fn may_reference(&self, formula_cell: CellRef, target: CellRef) -> bool {
            formula_cell != target && !self.cycles.contains(&(formula_cell, target))
        }

        fn value_at(&self, target: CellRef) -> String {
            self.values.get(&target).cloned().unwrap_or_default()
        }
    }

    fn cell(name: &str) -> CellRef {
        CellRef::from_str(name).unwrap()
    }

    fn run(grid: &TestGrid, input: &str) -> Parsed {
        parse(input, cell("E9"), grid)
    }

    fn formula(function: Function, body: Result<Vec<Parameter>, FormulaError>) -> Outcome {
        Outcome::Formula { function, body }
    }

    #[test]
    fn test_literals_pass_through() {
        let grid = TestGrid::default();
        let parsed = run(&grid, "hello = world");
        assert_eq!(parsed.outcome, Outcome::Literal("hello = world".into()));
        assert!(parsed.references.is_empty());
        assert_eq!(run(&grid, "").outcome, Outcome::Literal(String::new()));
    }

    #[test]
    fn test_bare_equals_is_error() {
        let grid = TestGrid::default();
        assert_eq!(run(&grid, "=").outcome, Outcome::Literal("#ERROR".into()));
    }

    #[test]
    fn test_call_with_range() {
        let grid = TestGrid::with(&[("A0", "2"), ("A1", "4"), ("A2", "6")]);
        let parsed = run(&grid, "=mean(A0:A2)");
        assert_eq!(
            parsed.outcome,
            formula(Function::Mean, Ok(vec![Parameter::Vector(vec![2.0, 4.0, 6.0])]))
        );
        assert_eq!(parsed.references, vec![cell("A0"), cell("A1"), cell("A2")]);
    }

    #[test]
    fn test_range_flattens_row_major_from_top_left() {
        let grid = TestGrid::with(&[("A0", "1"), ("B0", "2"), ("A1", "3"), ("B1", "4")]);
        let expected = formula(Function::Mean, Ok(vec![Parameter::Vector(vec![1.0, 2.0, 3.0, 4.0])]));
        assert_eq!(run(&grid, "=mean(A0:B1)").outcome, expected);
        assert_eq!(run(&grid, "=mean(B1:A0)").outcome, expected);
        assert_eq!(run(&grid, "=mean(A1:B0)").outcome, expected);
    }

    #[test]
    fn test_text_numbers_and_inline_vectors() {
        let grid = TestGrid::with(&[("B0", "5")]);
        let parsed = run(&grid, "=variance([sample]; 1, 2,B0)");
        assert_eq!(
            parsed.outcome,
            formula(
                Function::Variance,
                Ok(vec![
                    Parameter::Text("sample".into()),
                    Parameter::Vector(vec![1.0, 2.0, 5.0]),
                ])
            )
        );
        assert_eq!(parsed.references, vec![cell("B0")]);
    }

    #[test]
    fn test_spaces_kept_inside_text() {
        let grid = TestGrid::default();
        let parsed = run(&grid, "=replaceText([a b c]; [ ]; [_])");
        assert_eq!(
            parsed.outcome,
            formula(
                Function::ReplaceText,
                Ok(vec![
                    Parameter::Text("a b c".into()),
                    Parameter::Text(" ".into()),
                    Parameter::Text("_".into()),
                ])
            )
        );
    }

    #[test]
    fn test_single_reference_is_scalar_or_text() {
        let grid = TestGrid::with(&[("A0", "3.5"), ("A1", "word")]);
        assert_eq!(
            run(&grid, "=absolute(A0)").outcome,
            formula(Function::Absolute, Ok(vec![Parameter::Scalar(3.5)]))
        );
        assert_eq!(
            run(&grid, "=lengthText(A1)").outcome,
            formula(Function::LengthText, Ok(vec![Parameter::Text("word".into())]))
        );
        assert_eq!(
            run(&grid, "=lengthText(A2)").outcome,
            formula(Function::LengthText, Ok(vec![Parameter::Text(String::new())]))
        );
    }

    #[test]
    fn test_empty_arguments_are_skipped() {
        let grid = TestGrid::default();
        assert_eq!(
            run(&grid, "=absolute(;-2;)").outcome,
            formula(Function::Absolute, Ok(vec![Parameter::Scalar(-2.0)]))
        );
    }

    #[test]
    fn test_unknown_function_collapses_to_literal() {
        let grid = TestGrid::default();
        let parsed = run(&grid, "=sum(A0:A2)");
        assert_eq!(parsed.outcome, Outcome::Literal("#NAME?".into()));
        assert!(parsed.references.is_empty());
        assert_eq!(run(&grid, "=mean").outcome, Outcome::Literal("#NAME?".into()));
    }

    #[test]
    fn test_malformed_calls_keep_formula() {
        let grid = TestGrid::default();
        let name_error = formula(Function::Mean, Err(FormulaError::ArityOrType));
        assert_eq!(run(&grid, "=mean(1,2").outcome, name_error);
        assert_eq!(run(&grid, "=mean(1,2)x").outcome, name_error);
        assert_eq!(run(&grid, "=mean()").outcome, name_error);
        assert_eq!(run(&grid, "=mean(abc)").outcome, name_error);
        assert_eq!(run(&grid, "=mean(1,abc)").outcome, name_error);
        assert_eq!(run(&grid, "=mean(mean(1))").outcome, name_error);
        assert_eq!(run(&grid, "=mean([abc)").outcome, name_error);
    }

    #[test]
    fn test_bad_references_in_calls() {
        let mut grid = TestGrid::with(&[("A0", "x")]);
        grid.cycles.insert((cell("E9"), cell("B1")));
        let ref_error = formula(Function::Mean, Err(FormulaError::Reference));
        assert_eq!(run(&grid, "=mean(A99)").outcome, ref_error);
        assert_eq!(run(&grid, "=mean(Z0)").outcome, ref_error);
        assert_eq!(run(&grid, "=mean(E9)").outcome, ref_error);
        assert_eq!(run(&grid, "=mean(B1)").outcome, ref_error);
        assert_eq!(run(&grid, "=mean(B0:B3)").outcome, ref_error);
        assert_eq!(run(&grid, "=mean(Abc)").outcome, ref_error);
        assert_eq!(run(&grid, "=mean(A0:x)").outcome, ref_error);
    }

    #[test]
    fn test_non_numeric_range_keeps_references() {
        let grid = TestGrid::with(&[("A0", "1"), ("A1", "two")]);
        let parsed = run(&grid, "=mean(A0:A1)");
        assert_eq!(parsed.outcome, formula(Function::Mean, Err(FormulaError::Reference)));
        assert_eq!(parsed.references, vec![cell("A0"), cell("A1")]);
    }

    #[test]
    fn test_arithmetic_is_left_to_right() {
        let grid = TestGrid::with(&[("A1", "3"), ("B1", "4")]);
        let parsed = run(&grid, "=A1+B1*2");
        assert_eq!(
            parsed.outcome,
            formula(Function::Identity, Ok(vec![Parameter::Scalar(14.0)]))
        );
        assert_eq!(parsed.references, vec![cell("A1"), cell("B1")]);
        assert_eq!(
            run(&grid, "= 10 / 4 - 1").outcome,
            formula(Function::Identity, Ok(vec![Parameter::Scalar(1.5)]))
        );
    }

    #[test]
    fn test_arithmetic_single_text_operand_is_identity() {
        let grid = TestGrid::with(&[("A0", "hello")]);
        assert_eq!(
            run(&grid, "=A0").outcome,
            formula(Function::Identity, Ok(vec![Parameter::Text("hello".into())]))
        );
        assert_eq!(
            run(&grid, "=#note").outcome,
            formula(Function::Identity, Ok(vec![Parameter::Text("#note".into())]))
        );
    }

    #[test]
    fn test_arithmetic_errors_collapse_to_ref() {
        let grid = TestGrid::with(&[("A0", "hello"), ("A1", "1")]);
        let collapsed = Outcome::Literal("#REF!".into());
        assert_eq!(run(&grid, "=-5").outcome, collapsed);
        assert_eq!(run(&grid, "=A0+A1").outcome, collapsed);
        assert_eq!(run(&grid, "=A1+").outcome, collapsed);
        assert_eq!(run(&grid, "=A1+E9").outcome, collapsed);
        assert_eq!(run(&grid, "=Hello").outcome, collapsed);
        assert_eq!(run(&grid, "=#REF!+1").outcome, collapsed);
        assert!(run(&grid, "=A0+A1").references.is_empty());
    }

    #[test]
    fn test_tokenize_expression() {
        let (operands, operators) = tokenize_expression("A1+2*B3");
        assert_eq!(operands, vec!["A1", "2", "B3"]);
        assert_eq!(operators, vec![Operator::Add, Operator::Mul]);
    }

    #[test]
    fn test_strip_spaces() {
        assert_eq!(strip_spaces("mean( A0 : A2 )"), "mean(A0:A2)");
        assert_eq!(strip_spaces("f([a b]; 1)"), "f([a b];1)");
    }
}
