//! Filter expression engine.
//!
//! This module provides:
//! - Tokenization of raw filter strings
//! - Infix to postfix conversion with a fixed operator priority table
//! - Substitution of column references with row values
//! - Evaluation of postfix expressions on a boolean stack machine

pub mod error;
pub mod eval;
pub mod lexer;
pub mod postfix;
pub mod resolve;
pub mod token;

pub use error::{EvalError, EvalResult};
pub use eval::{evaluate, PostfixEvaluator};
pub use lexer::{tokenize, Lexer};
pub use postfix::to_postfix;
pub use resolve::resolve_fields;
pub use token::{Operator, Token};

use crate::table::Row;

/// A filter expression, tokenized once and shared by every row it is
/// matched against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    text: String,
    infix: Vec<Token>,
}

impl Query {
    /// Trim, upper-case and tokenize a raw filter string
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_uppercase();
        let infix = tokenize(&text);
        Self { text, infix }
    }

    /// An empty query matches every row
    pub fn is_empty(&self) -> bool {
        self.infix.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.infix
    }

    /// Evaluate the query against one row.
    ///
    /// The token template is copied before column references are resolved,
    /// so the query itself never changes.
    pub fn evaluate(&self, row: &Row<'_>) -> EvalResult<bool> {
        if self.is_empty() {
            return Ok(true);
        }

        let mut infix = self.infix.clone();
        resolve_fields(&mut infix, row);
        evaluate(&to_postfix(&infix))
    }
}

impl From<&str> for Query {
    fn from(raw: &str) -> Self {
        Query::new(raw)
    }
}
