//! In-memory catalogue store

use async_trait::async_trait;

use super::traits::CatalogueStore;
use crate::catalogue::Catalogue;
use crate::errors::CatalogueResult;
use crate::sources::builtin_catalogue;

/// Store backed by an already validated catalogue
///
/// Loads never fail. `Default` is an empty catalogue.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogueStore {
    catalogue: Catalogue,
    label: Option<&'static str>,
}

impl InMemoryCatalogueStore {
    pub fn new(catalogue: Catalogue) -> Self {
        Self {
            catalogue,
            label: None,
        }
    }

    /// Store serving the built-in sample catalogue
    pub fn builtin() -> CatalogueResult<Self> {
        Ok(Self {
            catalogue: builtin_catalogue()?,
            label: Some("built-in sample catalogue"),
        })
    }
}

#[async_trait]
impl CatalogueStore for InMemoryCatalogueStore {
    async fn load_catalogue(&self) -> CatalogueResult<Catalogue> {
        Ok(self.catalogue.clone())
    }

    fn describe(&self) -> String {
        format!(
            "{} ({} entries)",
            self.label.unwrap_or("in-memory catalogue"),
            self.catalogue.len()
        )
    }
}
