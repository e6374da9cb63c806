//! Error types and Result aliases for Quarry.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.
//!
//! Only two failure classes abort an indexing pass: repository acquisition
//! (`Error::Repository`) and cancellation (`Error::Cancelled`). Parse
//! failures and per-file errors are recovered locally by the indexer.

use thiserror::Error;

/// Result type alias using Quarry's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Quarry operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository acquisition error. Fatal to one prepare call.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Parse failure for one file. Always recoverable by callers.
    #[error("parse error: {0}")]
    Parse(String),

    /// Search backend error.
    #[error("search error: {0}")]
    Search(String),

    /// Operation cancelled via the cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// Operation that cannot be performed with the available state.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Repository-specific errors.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Local repository path does not exist.
    #[error("repository path does not exist: {path}")]
    MissingPath { path: String },

    /// Local repository path is not a directory.
    #[error("repository path is not a directory: {path}")]
    NotADirectory { path: String },

    /// Clone of a remote repository failed.
    #[error("failed to clone '{url}': {reason}")]
    Clone { url: String, reason: String },

    /// Path is not a version-controlled repository.
    #[error("not a git repository: {path}")]
    NotARepository { path: String },

    /// Underlying git operation failed.
    #[error("git error: {0}")]
    Git(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a search backend error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Self::Repository(RepositoryError::Git(err.message().to_string()))
    }
}

#[cfg(test)]
mod tests;
