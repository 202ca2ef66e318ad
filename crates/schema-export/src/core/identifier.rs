//! Identifier validation and quoting.
//!
//! Two quoting styles are needed: the generated script quotes identifiers with
//! double quotes, while data queries sent back to the source engine use
//! bracketed identifiers.
//!
//! Identifiers come from the source engine's own metadata, so they are
//! validated once when the schema is assembled (see [`validate_identifier`])
//! and quoted without further checks afterwards.

use crate::error::{ExportError, Result};

/// Maximum identifier length accepted from source metadata.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier reported by the source.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `ExportError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ExportError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(ExportError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(ExportError::Config(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote an identifier for the generated script.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// # Examples
///
/// ```
/// use schema_export::core::identifier::quote_ident;
///
/// assert_eq!(quote_ident("users"), "\"users\"");
/// assert_eq!(quote_ident("table\"name"), "\"table\"\"name\"");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote an identifier for a query sent to the source engine.
///
/// Escapes closing brackets by doubling them and wraps in brackets.
///
/// # Examples
///
/// ```
/// use schema_export::core::identifier::quote_source_ident;
///
/// assert_eq!(quote_source_ident("Order Details"), "[Order Details]");
/// assert_eq!(quote_source_ident("table]name"), "[table]]name]");
/// ```
pub fn quote_source_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("Order Details").is_ok());
        assert!(validate_identifier("日本語テーブル").is_ok());
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let err = validate_identifier("users\0; DROP TABLE x").unwrap_err();
        assert!(err.to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_long() {
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("T"), "\"T\"");
        assert_eq!(quote_ident("my table"), "\"my table\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_source_ident() {
        assert_eq!(quote_source_ident("Customers"), "[Customers]");
        assert_eq!(quote_source_ident("a]b"), "[a]]b]");
        assert_eq!(quote_source_ident("[x]"), "[[x]]]");
    }
}
