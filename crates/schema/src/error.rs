//! Validation errors.
//!
//! Leaf messages are stable and end up verbatim in error responses sent back
//! to remote callers. Location wrappers (`argument 0: ...`) only ever prefix
//! the leaf message.

use thiserror::Error;

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A value did not conform to its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid schema, undefined but not optional")]
    Missing,

    #[error("Invalid schema, null but does not allow null")]
    UnexpectedNull,

    #[error("Invalid schema, not a number (or bigint)")]
    NotANumber,

    #[error("Invalid schema, not a string")]
    NotAString,

    #[error("Invalid schema, not a bool")]
    NotABool,

    #[error("Invalid schema, not an array")]
    NotAnArray,

    #[error("Invalid schema, not an object")]
    NotAnObject,

    #[error("Invalid schema, invalid key: {key}")]
    InvalidKey { key: String },

    /// Every alternative of a union failed.
    #[error("Invalid schema, none of the schemas matched ({})", join_failures(.failures))]
    NoneMatched { failures: Vec<ValidationError> },

    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        source: Box<ValidationError>,
    },

    #[error("item {index}: {source}")]
    Item {
        index: usize,
        source: Box<ValidationError>,
    },

    #[error("key '{key}': {source}")]
    Key {
        key: String,
        source: Box<ValidationError>,
    },
}

fn join_failures(failures: &[ValidationError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Create an invalid key error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    /// Create an aggregate error for a failed union.
    #[must_use]
    pub const fn none_matched(failures: Vec<Self>) -> Self {
        Self::NoneMatched { failures }
    }

    /// Attribute this failure to a positional argument.
    #[must_use]
    pub fn at_argument(self, index: usize) -> Self {
        Self::Argument {
            index,
            source: Box::new(self),
        }
    }

    /// Attribute this failure to an array element.
    #[must_use]
    pub fn at_item(self, index: usize) -> Self {
        Self::Item {
            index,
            source: Box::new(self),
        }
    }

    /// Attribute this failure to an object key.
    #[must_use]
    pub fn at_key(self, key: impl Into<String>) -> Self {
        Self::Key {
            key: key.into(),
            source: Box::new(self),
        }
    }

    /// The innermost failure, with all location wrappers stripped.
    #[must_use]
    pub fn leaf(&self) -> &Self {
        match self {
            Self::Argument { source, .. } | Self::Item { source, .. } | Self::Key { source, .. } => {
                source.leaf()
            }
            other => other,
        }
    }
}
