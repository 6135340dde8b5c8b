//! Postfix expression evaluation.
//!
//! The evaluator is a small stack machine over token text. Comparisons are
//! purely lexicographic on the full token, quotes included, and produce the
//! boolean tokens `"1"` and `"0"`. Logical operators only accept those two
//! values.

use super::error::{EvalError, EvalResult};
use super::token::{Operator, Token};
use std::cmp::Ordering;

const TRUE: &str = "1";
const FALSE: &str = "0";

/// Stack machine for postfix token sequences
pub struct PostfixEvaluator {
    stack: Vec<String>,
}

impl PostfixEvaluator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
        }
    }

    /// Evaluate a postfix expression and return the result
    pub fn evaluate(mut self, postfix: &[Token]) -> EvalResult<bool> {
        for token in postfix {
            match token.operator() {
                Some(op) => self.apply(op)?,
                None => self.stack.push(token.as_str().to_uppercase()),
            }
        }

        match self.stack.len() {
            0 => Err(EvalError::EmptyExpression),
            1 => Ok(self.stack[0] == TRUE),
            count => Err(EvalError::DanglingOperands { count }),
        }
    }

    fn apply(&mut self, op: Operator) -> EvalResult<()> {
        let result = match op {
            Operator::Not => {
                let operand = self.pop(op)?;
                !as_bool(op, operand)?
            }
            Operator::And | Operator::Or => {
                let top = self.pop(op)?;
                let second = self.pop(op)?;
                let right = as_bool(op, top)?;
                let left = as_bool(op, second)?;
                if op == Operator::And {
                    left && right
                } else {
                    left || right
                }
            }
            op if op.is_comparison() => {
                let top = self.pop(op)?;
                let second = self.pop(op)?;
                compare(op, second.cmp(&top))
            }
            // Arithmetic ranks in the priority table but has no meaning here
            _ => return Err(EvalError::UnsupportedOperator(op.as_str().to_string())),
        };

        self.stack
            .push(if result { TRUE } else { FALSE }.to_string());
        Ok(())
    }

    fn pop(&mut self, op: Operator) -> EvalResult<String> {
        self.stack.pop().ok_or_else(|| EvalError::StackUnderflow {
            operator: op.as_str().to_string(),
        })
    }
}

/// Apply a comparison operator to the ordering of `left` against `right`
fn compare(op: Operator, ordering: Ordering) -> bool {
    match op {
        Operator::Eq => ordering == Ordering::Equal,
        Operator::NotEq => ordering != Ordering::Equal,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::LtEq => ordering != Ordering::Greater,
        Operator::GtEq => ordering != Ordering::Less,
        _ => false,
    }
}

fn as_bool(op: Operator, value: String) -> EvalResult<bool> {
    match value.as_str() {
        TRUE => Ok(true),
        FALSE => Ok(false),
        _ => Err(EvalError::NonBoolean {
            operator: op.as_str().to_string(),
            operand: value,
        }),
    }
}

/// Evaluate a postfix expression to a boolean.
pub fn evaluate(postfix: &[Token]) -> EvalResult<bool> {
    PostfixEvaluator::with_capacity(postfix.len()).evaluate(postfix)
}
