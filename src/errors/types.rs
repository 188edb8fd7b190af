//! Error type definitions for tvstream
//!
//! A hierarchical error system: each layer owns its enum and the top-level
//! [`AppError`] wraps them for the binary and for cross-layer helpers.

use serde::Serialize;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalogue construction or source errors
    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    /// Playback handoff errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Catalogue validation and source errors
#[derive(Error, Debug)]
pub enum CatalogueError {
    /// Two entries share the same identity key
    #[error("Duplicate entry id: {id}")]
    DuplicateId { id: String },

    /// A required field is empty
    #[error("Entry {id}: missing {field}")]
    MissingField { id: String, field: &'static str },

    /// A URL field is not an absolute URL
    #[error("Entry {id}: invalid {field} '{url}' - {message}")]
    InvalidUrl {
        id: String,
        field: &'static str,
        url: String,
        message: String,
    },

    /// Local file access failures
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Remote fetch failures
    #[error("HTTP error fetching {url}: {message}")]
    Http { url: String, message: String },

    /// Catalogue document could not be decoded
    #[error("Parse error ({format}): {message}")]
    Parse { format: String, message: String },
}

/// Load failure published to observers inside a snapshot
///
/// Unlike [`CatalogueError`] this is cloneable and comparable so it can live in
/// an immutable [`crate::projector::ViewState`] shared by every observer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadFailure {
    /// The store did not answer within the configured load timeout
    #[error("Catalogue load timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The store answered with an error
    #[error("Catalogue load failed: {message}")]
    Source { message: String },
}

/// Playback handoff errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The selected entry cannot be handed to a player
    #[error("Invalid selection {id}: {reason}")]
    InvalidSelection { id: String, reason: String },

    /// The player command could not be started
    #[error("Failed to launch player '{command}': {message}")]
    Launch { command: String, message: String },

    /// The player exited unsuccessfully
    #[error("Player '{command}' exited with status {status}")]
    PlayerExited { command: String, status: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl CatalogueError {
    /// Create a parse error for the given document format
    pub fn parse<F: Into<String>, M: Into<String>>(format: F, message: M) -> Self {
        Self::Parse {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error, hiding any credentials embedded in the URL
    pub fn http<M: Into<String>>(url: &str, message: M) -> Self {
        Self::Http {
            url: crate::utils::url::UrlUtils::obfuscate_credentials(url),
            message: message.into(),
        }
    }
}

impl From<CatalogueError> for LoadFailure {
    fn from(error: CatalogueError) -> Self {
        Self::Source {
            message: error.to_string(),
        }
    }
}

impl PlaybackError {
    /// Create an invalid selection error
    pub fn invalid_selection<I: Into<String>, R: Into<String>>(id: I, reason: R) -> Self {
        Self::InvalidSelection {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
