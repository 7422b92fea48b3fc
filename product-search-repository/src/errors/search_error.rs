//! Search error types.
//!
//! This module defines the errors that can occur while talking to the
//! document store, and how they are classified for retrying.

use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Failed to reach the document store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The operation did not complete within its allotted time.
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// The store answered with a status that signals temporary overload
    /// or an internal failure (429, 5xx).
    #[error("Store unavailable (status {status}): {body}")]
    Unavailable { status: u16, body: String },

    /// The store refused the request itself (any other non-success status).
    #[error("Request rejected (status {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to parse a response from the store.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Classify a non-success HTTP status returned by the store.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status == 429 || status >= 500 {
            Self::Unavailable { status, body }
        } else {
            Self::Rejected { status, body }
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// Timeouts, connection failures and overload statuses are transient.
    /// Rejected requests, serialization problems and unparseable responses
    /// will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::ConnectionError(_)
            | SearchError::Timeout(_)
            | SearchError::Unavailable { .. } => true,
            SearchError::Rejected { .. }
            | SearchError::IndexCreationError(_)
            | SearchError::ParseError(_) => false,
        }
    }
}
