//! Utility modules for tvstream
//!
//! Reusable helpers shared by the catalogue sources, the playback handoff and
//! the error types.

pub mod deterministic_uuid;
pub mod url;

// Re-export commonly used types for convenience
pub use deterministic_uuid::generate_entry_id;
pub use url::UrlUtils;
