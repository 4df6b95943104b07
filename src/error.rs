//! Error types for termtag.

use thiserror::Error;

/// Result type for termtag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for termtag operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A term was constructed without any words.
    #[error("Term must contain at least one word")]
    EmptyTerm,

    /// A grouping policy name was not recognized.
    #[error("Unknown grouping policy: '{0}'")]
    UnknownPolicy(String),

    /// A caller-supplied word span does not fit the term sequence it was
    /// applied to.
    #[error("Invalid span: {0}")]
    InvalidSpan(String),
}

impl Error {
    /// Create an unknown-policy error.
    pub fn unknown_policy(name: impl Into<String>) -> Self {
        Error::UnknownPolicy(name.into())
    }

    /// Create an invalid-span error.
    pub fn invalid_span(msg: impl Into<String>) -> Self {
        Error::InvalidSpan(msg.into())
    }
}
