//! Error types for the hwbot orchestrator.
//!
//! This module defines the error hierarchy for every stage of a polling
//! cycle (fetch, validate, translate), the chat notification boundary, and
//! startup configuration loading.

use std::path::PathBuf;

/// A specialized `Result` type for hwbot orchestrator operations.
pub type Result<T> = std::result::Result<T, HwbotError>;

/// Errors that can occur while watching homework review statuses.
///
/// Cycle failures (`ConnectionFailure` through `EmptyHomeworks`) are always
/// recovered by the poller. Configuration failures are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum HwbotError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Required credentials are absent from the environment.
    #[error("Required environment variables are missing: {}\n\nSuggestion: Set them in the environment or in a .env file", .missing.join(", "))]
    MissingCredentials {
        /// Names of the absent variables.
        missing: Vec<&'static str>,
    },

    /// Invalid JSON syntax in the settings file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your hwbot.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // API Client Errors
    // ========================================================================
    /// The transport could not complete the request (network, timeout, DNS).
    #[error("Request to the review API failed: {0}")]
    ConnectionFailure(#[source] reqwest::Error),

    /// The review API answered with something other than 200 OK.
    ///
    /// The display text stays generic so repeated failures with different
    /// codes collapse into one log line; the code is kept for structured logs.
    #[error("Unexpected response status from the review API")]
    UnexpectedStatus {
        /// The HTTP status code returned.
        status: u16,
    },

    /// The 200 response body could not be decoded as JSON.
    #[error("Review API returned a body that is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    // ========================================================================
    // Response Validation Errors
    // ========================================================================
    /// A value does not have the expected JSON shape.
    #[error("{0}")]
    ShapeError(String),

    /// A required key is missing (or null).
    #[error("Key '{key}' is missing from the response")]
    MissingKey {
        /// The absent key.
        key: &'static str,
    },

    /// The `homeworks` list is empty so there is no latest record.
    #[error("The 'homeworks' list is empty")]
    EmptyHomeworks,

    // ========================================================================
    // Status Translation Errors
    // ========================================================================
    /// The record carries a status outside the known verdict vocabulary.
    #[error("Unknown homework status in response: {status}")]
    UnknownStatus {
        /// The raw status value as it appeared in the response.
        status: String,
    },

    // ========================================================================
    // Notification Errors
    // ========================================================================
    /// The chat transport failed to deliver a message.
    #[error("Message was not sent: {0}")]
    NotificationFailed(String),
}

impl HwbotError {
    /// Creates a new `MissingCredentials` error.
    #[must_use]
    pub fn missing_credentials(missing: Vec<&'static str>) -> Self {
        Self::MissingCredentials { missing }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ShapeError`.
    #[must_use]
    pub fn shape(message: impl Into<String>) -> Self {
        Self::ShapeError(message.into())
    }

    /// Creates a new `MissingKey` error.
    #[must_use]
    pub const fn missing_key(key: &'static str) -> Self {
        Self::MissingKey { key }
    }

    /// Creates a new `UnknownStatus` error.
    #[must_use]
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Creates a new `NotificationFailed` error.
    #[must_use]
    pub fn notification(message: impl Into<String>) -> Self {
        Self::NotificationFailed(message.into())
    }

    /// Returns `true` if this error is fatal and requires immediate termination.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials { .. }
                | Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
        )
    }

    /// Renders this error followed by its chain of causes, joined by `": "`.
    ///
    /// Causes whose text is already part of the message are skipped.
    #[must_use]
    pub fn with_causes(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}
