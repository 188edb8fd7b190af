//! Catalogue stores
//!
//! Every store implements [`CatalogueStore`], which hands out one validated
//! [`crate::catalogue::Catalogue`] snapshot per load. Flat, grouped and by-id
//! access all derive from that snapshot.
//!
//! # Usage
//!
//! ```rust
//! use tvstream::repositories::{CatalogueStore, InMemoryCatalogueStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryCatalogueStore::builtin()?;
//! let grouped = store.get_grouped().await?;
//! assert_eq!(grouped.categories(), vec!["Movies", "Sports", "News"]);
//! assert!(store.get_by_id("missing").await?.is_none());
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod http;
pub mod in_memory;
pub mod traits;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::CatalogueConfig;
use crate::errors::CatalogueResult;
use crate::utils::url::UrlUtils;

pub use file::FileCatalogueStore;
pub use http::HttpCatalogueStore;
pub use in_memory::InMemoryCatalogueStore;
pub use traits::*;

/// Source location that selects the built-in sample catalogue
pub const BUILTIN_SOURCE: &str = "builtin";

/// Create the store described by the catalogue configuration
///
/// `builtin` selects the sample catalogue, `http(s)://` locations are fetched
/// remotely and anything else (optionally `file://`) is read from disk.
pub fn create_store(config: &CatalogueConfig) -> CatalogueResult<Arc<dyn CatalogueStore>> {
    let source = config.source.trim();

    let store: Arc<dyn CatalogueStore> = if source.is_empty() || source == BUILTIN_SOURCE {
        Arc::new(InMemoryCatalogueStore::builtin()?)
    } else if UrlUtils::is_http(source) {
        Arc::new(HttpCatalogueStore::new(
            source,
            config.format,
            config.request_timeout,
        )?)
    } else {
        let path = source.strip_prefix("file://").unwrap_or(source);
        Arc::new(FileCatalogueStore::new(PathBuf::from(path), config.format))
    };

    info!("Using catalogue source: {}", store.describe());
    Ok(store)
}
