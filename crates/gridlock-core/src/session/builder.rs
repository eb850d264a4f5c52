use std::fmt;

use gridlock_engine::engine::Formula;

/// Token list for the cell currently being edited.
///
/// Digits and decimal points typed one at a time join the number before
/// them, so keypad input `1`, `2` builds the single token `12`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormulaBuilder {
    tokens: Formula,
}

impl FormulaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        if let Some(last) = self.tokens.last_mut()
            && is_numeric_fragment(last)
            && is_numeric_fragment(&token)
        {
            // A number holds at most one decimal point.
            if !(last.contains('.') && token.contains('.')) {
                last.push_str(&token);
            }
            return;
        }
        self.tokens.push(token);
    }

    /// Drop the last token. No-op on an empty formula.
    pub fn remove_token(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    pub fn set_formula(&mut self, formula: &[String]) {
        self.tokens = formula.to_vec();
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn formula(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn is_numeric_fragment(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Tokens joined by single spaces.
impl fmt::Display for FormulaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}
