//! A single record matched against a filter.

use super::schema::{Schema, DEFAULT_SEPARATOR};
use crate::query::Query;

/// Values of one input line, aligned to a borrowed schema.
///
/// The number of values is not checked against the schema; missing trailing
/// values are simply absent.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    schema: &'a Schema,
    values: Vec<String>,
}

impl<'a> Row<'a> {
    pub fn new(schema: &'a Schema, values: Vec<String>) -> Self {
        Self { schema, values }
    }

    /// Split a line on `separator` into a row
    pub fn parse(schema: &'a Schema, line: &str, separator: &str) -> Self {
        let separator = if separator.is_empty() {
            DEFAULT_SEPARATOR
        } else {
            separator
        };
        Self::new(schema, line.split(separator).map(str::to_string).collect())
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Look up a value by column name (case-insensitive)
    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .position(&column.to_uppercase())
            .and_then(|index| self.value(index))
    }

    /// Check whether this row satisfies `query`.
    ///
    /// Evaluation errors are logged and count as a non-match.
    pub fn matches(&self, query: &Query) -> bool {
        match query.evaluate(self) {
            Ok(matched) => matched,
            Err(e) => {
                log::warn!("Failed to evaluate '{}': {}", query.text(), e);
                false
            }
        }
    }

    /// Parse `query` and check whether this row satisfies it
    pub fn matches_str(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.matches(&Query::new(query))
    }

    /// Render the row back into a line
    pub fn join(&self, separator: &str) -> String {
        self.values.join(separator)
    }
}
