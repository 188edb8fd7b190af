//! Centralized error handling for tvstream
//!
//! Errors are layered the same way the application is:
//!
//! - **Catalogue Errors**: validation of entries and failures reading a catalogue source
//! - **Load Failures**: cloneable, observable failures published inside a view-state snapshot
//! - **Playback Errors**: invalid selections and player launch failures
//!
//! # Usage
//!
//! ```rust
//! use tvstream::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::not_found("video", "m9"))
//! }
//!
//! assert!(example_function().is_err());
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for catalogue store and decoding Results
pub type CatalogueResult<T> = Result<T, CatalogueError>;

/// Convenience type alias for playback handoff Results
pub type PlaybackResult<T> = Result<T, PlaybackError>;
