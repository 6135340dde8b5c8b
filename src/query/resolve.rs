//! Column reference substitution.

use super::token::Token;
use crate::table::Row;

/// Replace every column reference in `tokens` with the row's value for that
/// column, wrapped in single quotes.
///
/// Literals, operators and grouping marks are left alone. A column the row
/// has no value for (a short line) keeps its name.
pub fn resolve_fields(tokens: &mut [Token], row: &Row<'_>) {
    for token in tokens.iter_mut() {
        if !token.is_operand() || token.is_literal() {
            continue;
        }

        let Some(index) = row.schema().position(token.as_str()) else {
            continue;
        };

        match row.value(index) {
            Some(value) => *token = Token::literal(value),
            None => log::debug!(
                "Row has {} values, no value for column {} at position {}",
                row.values().len(),
                token,
                index
            ),
        }
    }
}
