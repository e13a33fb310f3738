//! Error types for the churchen client.
//!
//! This module defines custom error types that categorize the failures that
//! can occur while talking to the Churchen API and managing local state.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the churchen client.
#[derive(Error, Debug)]
pub enum ChurnError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level failure: the request never completed.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {message}")]
    Api { message: String },

    /// A required input was missing; no network call was attempted.
    #[error("{message}")]
    Precondition { message: String },

    /// The backend answered with a shape the decoder does not accept.
    #[error("Unrecognized response shape: {message}")]
    UnrecognizedResponse { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}

impl ChurnError {
    /// Shorthand for a precondition failure with a user-facing message.
    pub fn precondition(message: impl Into<String>) -> Self {
        ChurnError::Precondition {
            message: message.into(),
        }
    }
}
