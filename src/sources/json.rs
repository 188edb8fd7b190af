//! JSON catalogue decoding
//!
//! Accepts either a bare array of entries or an object with a `videos` array:
//!
//! ```json
//! { "videos": [ { "id": "m1", "title": "Big Buck Bunny", "thumbnail_url": "...",
//!                 "media_url": "...", "category": "Movies" } ] }
//! ```

use serde::Deserialize;

use crate::errors::{CatalogueError, CatalogueResult};
use crate::models::VideoEntry;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogueDocument {
    Bare(Vec<VideoEntry>),
    Wrapped { videos: Vec<VideoEntry> },
}

/// Decode a JSON catalogue document into entries in document order
pub fn parse_document(content: &str) -> CatalogueResult<Vec<VideoEntry>> {
    let document: CatalogueDocument = serde_json::from_str(content)
        .map_err(|e| CatalogueError::parse("json", e.to_string()))?;

    Ok(match document {
        CatalogueDocument::Bare(entries) => entries,
        CatalogueDocument::Wrapped { videos } => videos,
    })
}
