//! Row and schema model for delimited text tables.

pub mod row;
pub mod schema;

pub use row::Row;
pub use schema::{Schema, DEFAULT_SEPARATOR};

use thiserror::Error;

/// Errors raised while building a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema has no columns")]
    Empty,

    #[error("Duplicate column {name} (first defined at position {position})")]
    DuplicateColumn { name: String, position: usize },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
