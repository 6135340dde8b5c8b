//! Column names of a delimited table.

use super::{SchemaError, SchemaResult};

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = ",";

/// Ordered, upper-case column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Create a schema from column names.
    ///
    /// Names are trimmed and upper-cased. Duplicates (compared
    /// case-insensitively) are rejected, and so is a list with no non-blank
    /// name, such as the columns of an empty header line.
    pub fn new<I, S>(columns: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = columns
            .into_iter()
            .map(|column| column.as_ref().trim().to_uppercase())
            .collect();

        if names.iter().all(String::is_empty) {
            return Err(SchemaError::Empty);
        }

        for (index, name) in names.iter().enumerate() {
            if let Some(position) = names[..index].iter().position(|existing| existing == name) {
                return Err(SchemaError::DuplicateColumn {
                    name: name.clone(),
                    position,
                });
            }
        }

        Ok(Self { columns: names })
    }

    /// Build a schema from a header line split on `separator`.
    pub fn from_header(line: &str, separator: &str) -> SchemaResult<Self> {
        let separator = if separator.is_empty() {
            DEFAULT_SEPARATOR
        } else {
            separator
        };
        Self::new(line.split(separator))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the first column named exactly `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}
