//! Infix to postfix conversion (shunting-yard).

use super::token::{priority, Token};

/// Convert an infix token sequence into postfix order.
///
/// Every token is upper-cased first. Operators of equal rank are popped
/// before the incoming one is pushed, so all operators are left-associative.
/// Unbalanced parentheses are tolerated: a stray `)` is dropped and an
/// unclosed `(` never reaches the output.
pub fn to_postfix(infix: &[Token]) -> Vec<Token> {
    let mut postfix = Vec::with_capacity(infix.len());
    let mut stack: Vec<Token> = Vec::with_capacity(infix.len());

    for token in infix {
        let token = token.to_uppercase();

        if token.is_left_paren() {
            stack.push(token);
        } else if token.is_right_paren() {
            while let Some(top) = stack.pop() {
                if top.is_left_paren() {
                    break;
                }
                postfix.push(top);
            }
        } else if let Some(op) = token.operator() {
            while let Some(top) = stack.last() {
                if top.is_left_paren() || priority(top) < op.priority() {
                    break;
                }
                if let Some(top) = stack.pop() {
                    postfix.push(top);
                }
            }
            stack.push(token);
        } else {
            postfix.push(token);
        }
    }

    while let Some(top) = stack.pop() {
        if !top.is_left_paren() {
            postfix.push(top);
        }
    }

    postfix
}
