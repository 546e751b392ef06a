//! Error types for repositories.

use quarry_id::IdError;
use quarry_spec::SpecError;
use thiserror::Error;

/// Errors raised by repositories and units of work.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The specification could not be evaluated.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// A new entity needed an id and none could be generated.
    #[error(transparent)]
    Id(#[from] IdError),

    #[error("{key} not found")]
    NotFound { key: String },

    #[error("{key} already exists")]
    DuplicateKey { key: String },

    /// A single-result read matched more than one entity.
    #[error("expected at most one result, found {count}")]
    MultipleResults { count: usize },

    /// Configuration could not be read or parsed.
    #[error("invalid repository configuration: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
