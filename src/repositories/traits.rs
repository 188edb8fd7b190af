//! Catalogue store trait definitions

use async_trait::async_trait;

use crate::catalogue::Catalogue;
use crate::errors::CatalogueResult;
use crate::models::{GroupedView, VideoEntry};

/// Read-only access to a video catalogue
///
/// Operations are async and fallible so remote sources fit behind the same
/// interface. A missing id is `Ok(None)`, never an error.
///
/// # Examples
///
/// ```rust
/// use tvstream::repositories::CatalogueStore;
///
/// async fn print_rows(store: &dyn CatalogueStore) -> Result<(), Box<dyn std::error::Error>> {
///     for row in store.get_grouped().await?.iter() {
///         println!("{}: {} videos", row.category, row.len());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait CatalogueStore: Send + Sync {
    /// Fetch one consistent catalogue snapshot
    ///
    /// The other operations derive from this; callers that need more than one
    /// view should call it once and derive the views themselves.
    async fn load_catalogue(&self) -> CatalogueResult<Catalogue>;

    /// Every entry in canonical order
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<VideoEntry>)` - Entries (may be empty)
    /// * `Err(CatalogueError)` - The source could not be read or decoded
    async fn get_all(&self) -> CatalogueResult<Vec<VideoEntry>> {
        let catalogue = self.load_catalogue().await?;
        Ok(catalogue.entries().iter().map(|entry| (**entry).clone()).collect())
    }

    /// Entries grouped by category in first-seen order
    async fn get_grouped(&self) -> CatalogueResult<GroupedView> {
        Ok(self.load_catalogue().await?.grouped())
    }

    /// Look up an entry by id
    ///
    /// # Returns
    ///
    /// * `Ok(Some(VideoEntry))` - Entry found
    /// * `Ok(None)` - No entry with that id
    /// * `Err(CatalogueError)` - The source could not be read or decoded
    async fn get_by_id(&self, id: &str) -> CatalogueResult<Option<VideoEntry>> {
        Ok(self
            .load_catalogue()
            .await?
            .get(id)
            .map(|entry| (*entry).clone()))
    }

    /// Human-readable description of the source for logs
    fn describe(&self) -> String;
}
