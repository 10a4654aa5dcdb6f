//! Reserved words and identifier rules

use crate::error::{Error, Result};

/// Words that may not be used as identifiers or bare inserted values.
const RESERVED_WORDS: [&str; 20] = [
    "USE", "CREATE", "DROP", "ALTER", "INSERT", "INTO", "SELECT", "UPDATE", "DELETE", "JOIN",
    "DATABASE", "TABLE", "WHERE", "ON", "LIKE", "SET", "ADD", "VALUES", "FROM", "*",
];

/// Check whether a word collides with the reserved-word set (case-insensitive)
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(word))
}

/// Validate a database/table/column name
///
/// Names must be non-empty, purely alphanumeric, and not reserved.
pub fn validate_identifier(name: &str) -> Result<()> {
    if is_reserved(name) {
        return Err(Error::ReservedWord(name.to_string()));
    }
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved("SELECT"));
        assert!(is_reserved("select"));
        assert!(is_reserved("SeLeCt"));
        assert!(is_reserved("*"));
        assert!(!is_reserved("marks"));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("marks2024").is_ok());
        assert!(matches!(
            validate_identifier("table"),
            Err(Error::ReservedWord(_))
        ));
        assert!(matches!(
            validate_identifier("bad-name"),
            Err(Error::InvalidIdentifier(_))
        ));
        assert!(matches!(
            validate_identifier(""),
            Err(Error::InvalidIdentifier(_))
        ));
    }
}
