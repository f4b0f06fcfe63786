// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Rockhound

use thiserror::Error;

/// Result type alias for Rockhound operations
pub type Result<T> = std::result::Result<T, RockhoundError>;

/// Rockhound error types
///
/// Unparseable AI output and missing records are not represented here:
/// the former degrades to a fallback identification, the latter is `None`.
#[derive(Error, Debug)]
pub enum RockhoundError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RockhoundError {
    /// True for failures talking to a remote service.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Api(_) | Self::ServiceUnavailable(_))
    }
}
