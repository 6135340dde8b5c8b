//! Error types for postfix evaluation.

use thiserror::Error;

/// Errors that can occur while evaluating a postfix expression.
///
/// None of these abort a scan; the row being matched is treated as a
/// non-match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("Operator {operator} expects a boolean operand ('0' or '1'), got {operand}")]
    NonBoolean { operator: String, operand: String },

    #[error("Operator {operator} is missing an operand")]
    StackUnderflow { operator: String },

    #[error("Operator {0} is not supported in filter expressions")]
    UnsupportedOperator(String),

    #[error("Expression is empty")]
    EmptyExpression,

    #[error("Expression left {count} values on the stack, expected one")]
    DanglingOperands { count: usize },
}

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
