//! Recursive-descent formula evaluation.
//!
//! Grammar (left-associative):
//!
//! ```text
//! expression := term { ("+" | "-") term }
//! term       := factor { term_operator factor }
//! factor     := number | "(" expression ")" | cell_reference
//! ```
//!
//! `term_operator` is `*`, `/` or one of the unary transforms (`x^2`, `sin`,
//! `Rand`, ...). A unary transform still consumes the factor that follows it
//! but applies only to the running term value.
//!
//! The first error recorded wins. After it, every `expression`/`term`/`factor`
//! returns the last good result without consuming anything, and the final
//! result of a failed evaluation is that last good result.

use rand::Rng;
use rand::rngs::{StdRng, ThreadRng};

use super::cell_ref::CellRef;
use super::error::FormulaError;
use super::token::{Operator, Token};

/// Read access to cached cell values.
pub trait CellSource {
    /// Value of a referenced cell, or the error that referencing it produces.
    fn cell_value(&self, cell_ref: &CellRef) -> Result<f64, FormulaError>;
}

/// Source of uniform samples in `[0, 1)` for the `Rand` operator.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }
}

impl RandomSource for ThreadRng {
    fn next_unit(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }
}

/// Outcome of evaluating one formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    pub error: Option<FormulaError>,
}

impl Evaluation {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Evaluates token formulas against cached cell values.
pub struct FormulaEvaluator<'a> {
    cells: &'a dyn CellSource,
    random: &'a mut dyn RandomSource,
}

impl<'a> FormulaEvaluator<'a> {
    pub fn new(cells: &'a dyn CellSource, random: &'a mut dyn RandomSource) -> Self {
        FormulaEvaluator { cells, random }
    }

    pub fn evaluate(&mut self, formula: &[String]) -> Evaluation {
        if formula.is_empty() {
            return Evaluation {
                value: 0.0,
                error: Some(FormulaError::EmptyFormula),
            };
        }

        let mut parser = Parser {
            tokens: formula,
            pos: 0,
            error: None,
            last: 0.0,
            cells: self.cells,
            random: &mut *self.random,
        };
        let value = parser.expression();

        if parser.pos < formula.len() && parser.error.is_none() {
            parser.error = Some(FormulaError::InvalidFormula);
        }

        match parser.error {
            None => Evaluation { value, error: None },
            Some(err) => Evaluation {
                value: parser.last,
                error: Some(match err {
                    FormulaError::Partial => FormulaError::InvalidFormula,
                    other => other,
                }),
            },
        }
    }
}

struct Parser<'t, 'a> {
    tokens: &'t [String],
    pos: usize,
    error: Option<FormulaError>,
    /// Last good intermediate result.
    last: f64,
    cells: &'a dyn CellSource,
    random: &'a mut dyn RandomSource,
}

impl Parser<'_, '_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|t| Token::parse(t))
    }

    fn peek_operator(&self) -> Option<Operator> {
        match self.peek() {
            Some(Token::Operator(op)) => Some(op),
            _ => None,
        }
    }

    /// Record `err` unless an earlier error is already held.
    fn fail(&mut self, err: FormulaError, value: f64) {
        if self.error.is_none() {
            self.error = Some(err);
            self.last = value;
        }
    }

    fn expression(&mut self) -> f64 {
        if self.error.is_some() {
            return self.last;
        }
        let mut result = self.term();
        while self.error.is_none() {
            let Some(op) = self.peek_operator().filter(Operator::is_additive) else {
                break;
            };
            self.pos += 1;
            let rhs = self.term();
            if self.error.is_some() {
                break;
            }
            if op == Operator::Add {
                result += rhs;
            } else {
                result -= rhs;
            }
            self.last = result;
        }
        self.settle(result)
    }

    fn term(&mut self) -> f64 {
        if self.error.is_some() {
            return self.last;
        }
        let mut result = self.factor();
        while self.error.is_none() {
            let Some(op) = self.peek_operator().filter(|op| !op.is_additive()) else {
                break;
            };
            self.pos += 1;
            let rhs = self.factor();
            if self.error.is_some() {
                break;
            }
            match self.apply(op, result, rhs) {
                Ok(value) => {
                    result = value;
                    self.last = result;
                }
                Err((err, value)) => self.fail(err, value),
            }
        }
        self.settle(result)
    }

    /// Keep `result` as the last good value, or hand back the value held when
    /// an error was recorded.
    fn settle(&mut self, result: f64) -> f64 {
        if self.error.is_some() {
            return self.last;
        }
        self.last = result;
        result
    }

    fn factor(&mut self) -> f64 {
        if self.error.is_some() {
            return self.last;
        }
        let Some(token) = self.peek() else {
            self.fail(FormulaError::Partial, self.last);
            return 0.0;
        };
        self.pos += 1;

        match token {
            Token::Number(n) => {
                self.last = n;
                n
            }
            Token::LeftParen => {
                let result = self.expression();
                if self.peek() == Some(Token::RightParen) {
                    self.pos += 1;
                } else {
                    self.fail(FormulaError::MissingParentheses, result);
                }
                result
            }
            // A closing parenthesis where a factor should start: "( )" or a stray ")".
            Token::RightParen => {
                self.fail(FormulaError::MissingParentheses, 0.0);
                0.0
            }
            Token::Cell(cell_ref) => match self.cells.cell_value(&cell_ref) {
                Ok(value) => value,
                Err(err) => {
                    self.fail(err, 0.0);
                    0.0
                }
            },
            Token::Operator(_) | Token::Unknown => {
                self.fail(FormulaError::InvalidFormula, self.last);
                0.0
            }
        }
    }

    /// Apply a term operator to the running value `acc` and the factor `rhs`.
    fn apply(&mut self, op: Operator, acc: f64, rhs: f64) -> Result<f64, (FormulaError, f64)> {
        let value = match op {
            Operator::Multiply => acc * rhs,
            Operator::Divide => {
                if rhs == 0.0 {
                    return Err((FormulaError::DivideByZero, f64::INFINITY));
                }
                acc / rhs
            }
            Operator::Square => acc.powi(2),
            Operator::Cube => acc.powi(3),
            Operator::Reciprocal => {
                if acc == 0.0 {
                    return Err((FormulaError::DivideByZero, f64::INFINITY));
                }
                1.0 / acc
            }
            Operator::SquareRoot => {
                if acc < 0.0 {
                    return Err((FormulaError::NegativeRoot, f64::NAN));
                }
                acc.sqrt()
            }
            Operator::CubeRoot => acc.cbrt(),
            Operator::Sin => sin_degrees(acc),
            Operator::Cos => cos_degrees(acc),
            Operator::Tan => tan_degrees(acc).ok_or((FormulaError::Tan90, f64::NAN))?,
            Operator::ArcSin => asin_degrees(acc).ok_or((FormulaError::InvalidInput, f64::NAN))?,
            Operator::ArcCos => acos_degrees(acc).ok_or((FormulaError::InvalidInput, f64::NAN))?,
            Operator::ArcTan => atan_degrees(acc),
            Operator::Rand => self.random.next_unit(),
            Operator::Negate => -acc,
            Operator::Add | Operator::Subtract => unreachable!("additive operators bind in expression"),
        };
        Ok(value)
    }
}

// Trig operators take and return degrees. Quadrant angles are matched on the
// reduced degree value so they come out exact.

fn reduce_degrees(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}

fn sin_degrees(degrees: f64) -> f64 {
    match reduce_degrees(degrees) {
        0.0 | 180.0 => 0.0,
        90.0 => 1.0,
        270.0 => -1.0,
        d => d.to_radians().sin(),
    }
}

fn cos_degrees(degrees: f64) -> f64 {
    match reduce_degrees(degrees) {
        0.0 => 1.0,
        90.0 | 270.0 => 0.0,
        180.0 => -1.0,
        d => d.to_radians().cos(),
    }
}

fn tan_degrees(degrees: f64) -> Option<f64> {
    match reduce_degrees(degrees) {
        0.0 | 180.0 => Some(0.0),
        90.0 | 270.0 => None,
        d => Some(d.to_radians().tan()),
    }
}

fn asin_degrees(x: f64) -> Option<f64> {
    if !(-1.0..=1.0).contains(&x) {
        return None;
    }
    Some(match x {
        0.0 => 0.0,
        1.0 => 90.0,
        -1.0 => -90.0,
        _ => x.asin().to_degrees(),
    })
}

fn acos_degrees(x: f64) -> Option<f64> {
    if !(-1.0..=1.0).contains(&x) {
        return None;
    }
    Some(match x {
        0.0 => 90.0,
        1.0 => 0.0,
        -1.0 => 180.0,
        _ => x.acos().to_degrees(),
    })
}

fn atan_degrees(x: f64) -> f64 {
    match x {
        0.0 => 0.0,
        1.0 => 45.0,
        -1.0 => -45.0,
        _ => x.atan().to_degrees(),
    }
}
