// src/error.rs

//! Unified error handling for the crawler and lookup engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for fischdex operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The page that seeds a crawl could not be fetched
    #[error("Listing page {url} could not be fetched: {reason}")]
    Listing { url: String, reason: String },

    /// Lookup against a dataset name that does not exist
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fatal listing error.
    pub fn listing(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Listing {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an unknown-dataset error.
    pub fn unknown_dataset(name: impl Into<String>) -> Self {
        Self::UnknownDataset(name.into())
    }
}
