//! Validation of caller-supplied column names.
//!
//! Predicate and field-value maps name columns with plain strings that end up spliced
//! into SQL text. Only simple identifiers are accepted:
//!
//! - each part matches `[A-Za-z_][A-Za-z0-9_$]*`
//! - parts may be joined with `.` (`alias.column`)
//!
//! Anything else is rejected with [`OrmError::InvalidIdentifier`].

use crate::error::{OrmError, OrmResult};

/// Validate a column name, returning it trimmed of surrounding whitespace.
pub fn column(name: &str) -> OrmResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(OrmError::InvalidIdentifier(name.to_string()));
    }
    if trimmed.split('.').all(is_simple) {
        Ok(trimmed)
    } else {
        Err(OrmError::InvalidIdentifier(name.to_string()))
    }
}

fn is_simple(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}
