// src/error.rs

//! Error types for display configuration negotiation.
//!
//! None of these are fatal. A live session keeps rendering with the last
//! known-good configuration, so every error here describes a value that was
//! ignored, clamped, or replaced with a default. Callers typically just log them.

use std::fmt;

/// Recoverable configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A raw or named value did not map to any variant of a filter/scaler enum.
    /// The previous wanted value is retained.
    InvalidEnum { field: &'static str, value: String },
    /// A numeric parameter was outside its supported range and was clamped.
    OutOfRange {
        field: &'static str,
        requested: f64,
        clamped: f64,
    },
    /// Filter inheritance was requested before any display mode was known.
    /// Resolution falls back to linear filtering.
    NoActiveMode,
}

impl ConfigError {
    pub(crate) fn invalid_enum(field: &'static str, value: impl ToString) -> Self {
        ConfigError::InvalidEnum {
            field,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidEnum { field, value } => {
                write!(f, "invalid value '{}' for {}, keeping previous", value, field)
            }
            ConfigError::OutOfRange {
                field,
                requested,
                clamped,
            } => write!(
                f,
                "{} out of range: requested {}, clamped to {}",
                field, requested, clamped
            ),
            ConfigError::NoActiveMode => {
                write!(f, "no active display mode to inherit a filter from, using linear")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
