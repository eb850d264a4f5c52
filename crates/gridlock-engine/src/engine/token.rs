//! Classification of formula tokens.
//!
//! Formulas travel as ordered lists of strings. The evaluator, dependency
//! extraction and request validation all look at a token through
//! [`Token::parse`].

use super::cell_ref::CellRef;

/// An ordered token list, the persisted and wire form of a cell formula.
pub type Formula = Vec<String>;

/// Every operator a formula may contain.
///
/// `+` and `-` bind at expression level; everything else is consumed in the
/// term loop. Apart from `*` and `/`, term operators transform the running
/// term value rather than combining it with the following factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Square,
    Cube,
    Reciprocal,
    SquareRoot,
    CubeRoot,
    Sin,
    Cos,
    Tan,
    ArcSin,
    ArcCos,
    ArcTan,
    Rand,
    Negate,
}

impl Operator {
    pub const ALL: [Operator; 17] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Square,
        Operator::Cube,
        Operator::Reciprocal,
        Operator::SquareRoot,
        Operator::CubeRoot,
        Operator::Sin,
        Operator::Cos,
        Operator::Tan,
        Operator::ArcSin,
        Operator::ArcCos,
        Operator::ArcTan,
        Operator::Rand,
        Operator::Negate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Square => "x^2",
            Operator::Cube => "x^3",
            Operator::Reciprocal => "1/x",
            Operator::SquareRoot => "x^(1/2)",
            Operator::CubeRoot => "x^(1/3)",
            Operator::Sin => "sin",
            Operator::Cos => "cos",
            Operator::Tan => "tan",
            Operator::ArcSin => "sin^-1",
            Operator::ArcCos => "cos^-1",
            Operator::ArcTan => "tan^-1",
            Operator::Rand => "Rand",
            Operator::Negate => "+/-",
        }
    }

    pub fn from_token(token: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.as_str() == token)
    }

    /// Operators handled by the expression loop.
    pub fn is_additive(&self) -> bool {
        matches!(self, Operator::Add | Operator::Subtract)
    }
}

/// A classified token.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Operator(Operator),
    LeftParen,
    RightParen,
    Cell(CellRef),
    Unknown,
}

impl Token {
    pub fn parse(token: &str) -> Token {
        if let Some(op) = Operator::from_token(token) {
            return Token::Operator(op);
        }
        match token {
            "(" => return Token::LeftParen,
            ")" => return Token::RightParen,
            _ => {}
        }
        if let Some(n) = parse_number(token) {
            return Token::Number(n);
        }
        if let Some(cell) = CellRef::from_label(token) {
            return Token::Cell(cell);
        }
        Token::Unknown
    }
}

/// Decimal numerals only: `f64::from_str` also accepts `inf` and `NaN`,
/// which are not numbers a formula can contain.
fn parse_number(token: &str) -> Option<f64> {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    token.parse::<f64>().ok()
}
