//! Error types for TabDB
//!
//! This module defines all error types used throughout the engine. Every
//! variant renders to the human-readable reason that follows `[ERROR]: ` in
//! a response.

use thiserror::Error;

/// The main error type for TabDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Tokenizer Errors ==========
    #[error("Malformed command: unbalanced single quotes")]
    UnbalancedQuotes,

    // ========== Command Errors ==========
    #[error("Malformed command: missing ';' at end of command")]
    MissingSemicolon,

    #[error("Malformed command: {0}")]
    Malformed(String),

    #[error("Malformed command: unrecognized command '{0}'")]
    UnknownCommand(String),

    // ========== Catalog Errors ==========
    #[error("Database '{0}' does not exist")]
    DatabaseNotFound(String),

    #[error("Database '{0}' already exists")]
    DatabaseAlreadyExists(String),

    #[error("No database selected")]
    NoDatabaseSelected,

    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Column '{0}' does not exist")]
    ColumnNotFound(String),

    #[error("Column '{0}' already exists")]
    ColumnAlreadyExists(String),

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    // ========== Validation Errors ==========
    #[error("'{0}' is a reserved word")]
    ReservedWord(String),

    #[error("Invalid name '{0}': names must be non-empty and alphanumeric")]
    InvalidIdentifier(String),

    #[error("Expected {expected} value(s) but got {found}")]
    ValueCount { expected: usize, found: usize },

    #[error("Value '{0}' may not contain whitespace")]
    InvalidValue(String),

    #[error("The 'id' column cannot be added, dropped, or updated")]
    ImmutableId,

    // ========== Evaluation Errors ==========
    #[error("Cannot compare non-numeric value '{0}' with a relational operator")]
    NonNumericOperand(String),

    #[error("Unsupported comparator '{0}'")]
    UnknownComparator(String),

    // ========== Storage Errors ==========
    #[error("Corrupt table file '{0}'")]
    CorruptTableFile(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for TabDB operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("marks".to_string());
        assert_eq!(err.to_string(), "Table 'marks' does not exist");

        let err = Error::ValueCount {
            expected: 2,
            found: 3,
        };
        assert_eq!(err.to_string(), "Expected 2 value(s) but got 3");
    }
}
