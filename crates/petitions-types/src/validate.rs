//! Shape checks applied to request bodies after deserialization.
//!
//! Deserialization already rejects wrong JSON types and missing required
//! fields. `Validate` covers what serde cannot express: string lengths,
//! non-negative numbers and collection bounds.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Checks a required string's length in characters, inclusive on both ends.
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError(format!(
            "{field} must be at least {min} character{}",
            if min == 1 { "" } else { "s" }
        )));
    }
    if len > max {
        return Err(ValidationError(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

pub fn check_optional_length(
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => check_length(field, v, min, max),
        None => Ok(()),
    }
}

pub fn check_non_negative(field: &str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError(format!("{field} must not be negative")));
    }
    Ok(())
}
