//! Error types for the specification crate.

use thiserror::Error;

/// Errors raised while building or evaluating specifications.
///
/// Every variant is a caller-contract violation: none of them is retried
/// or swallowed inside the crate.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A second terminal projection was set on one specification.
    #[error("concurrent selectors: {existing} is already set, cannot also set {attempted}")]
    ConcurrentSelectors {
        existing: &'static str,
        attempted: &'static str,
    },

    /// A projecting specification reached the projection step without a selector.
    #[error("selector not found: a projecting specification needs select or select_many")]
    SelectorNotFound,

    /// A search or regex pattern failed to compile.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// An assignment targets a field the record does not expose for writing.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// An assignment value has the wrong kind for its field.
    #[error("type mismatch on '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Paging was requested without any ordering while strict paging is on.
    #[error("skip/take requires an ordering when strict paging is enabled")]
    UnorderedPaging,
}

impl SpecError {
    /// Create an unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            actual,
        }
    }
}

/// Result type for specification operations.
pub type Result<T> = std::result::Result<T, SpecError>;
