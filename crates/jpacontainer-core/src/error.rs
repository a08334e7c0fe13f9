//! Core error types.

use thiserror::Error;

/// Errors raised by the metadata engine and the filter translation layer.
///
/// Every variant is a configuration or mapping error: the caller handed in a
/// class, type description or filter that cannot be processed. None of them
/// is worth retrying.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while loading type descriptions.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// No type description registered under the name.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A type description is inconsistent.
    #[error("invalid type description: {0}")]
    InvalidDescriptor(String),

    /// The class lacks the entity marker.
    #[error("{0} is not an entity")]
    NotAnEntity(String),

    /// The class is neither an entity nor an embeddable.
    #[error("{0} is neither an entity nor an embeddable")]
    NotMapped(String),

    /// No identifier annotation anywhere in the mapped superclass chain.
    #[error("no identifier property found for {0}")]
    MissingIdentifier(String),

    /// No converter can translate the filter variant.
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// The filter references properties that are not filterable.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A query cannot be evaluated (unbound parameter, unknown join alias).
    #[error("evaluation error: {0}")]
    Evaluation(String),
}

impl Error {
    /// Check if the error stems from an unusable argument (class, type
    /// description or filter).
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownType(_)
                | Error::InvalidDescriptor(_)
                | Error::NotAnEntity(_)
                | Error::NotMapped(_)
                | Error::MissingIdentifier(_)
                | Error::InvalidFilter(_)
        )
    }
}
