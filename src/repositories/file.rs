//! File-backed catalogue store

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::traits::CatalogueStore;
use crate::catalogue::Catalogue;
use crate::errors::{CatalogueError, CatalogueResult};
use crate::sources::{self, SourceFormat};

/// Store that re-reads a local JSON or M3U document on every load
#[derive(Debug, Clone)]
pub struct FileCatalogueStore {
    path: PathBuf,
    format: SourceFormat,
}

impl FileCatalogueStore {
    pub fn new(path: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

#[async_trait]
impl CatalogueStore for FileCatalogueStore {
    async fn load_catalogue(&self) -> CatalogueResult<Catalogue> {
        let location = self.path.display().to_string();
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogueError::Io {
                path: location.clone(),
                source,
            })?;
        debug!("Read {} bytes from {}", content.len(), location);

        sources::decode(&location, &content, self.format)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
