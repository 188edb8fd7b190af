use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single playable video in the catalogue
///
/// Entries are immutable values; views share them through `Arc` and the
/// playback handoff copies the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoEntry {
    /// Unique, stable identity key
    pub id: String,
    /// Display title
    pub title: String,
    /// Absolute thumbnail URL, empty when the source has no artwork
    #[serde(default, alias = "thumbnailUrl")]
    pub thumbnail_url: String,
    /// Progressive file or adaptive-streaming manifest URL
    #[serde(alias = "mediaUrl", alias = "videoUrl")]
    pub media_url: String,
    /// Row grouping key (e.g. "Movies", "Sports", "News")
    pub category: String,
}

impl VideoEntry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        thumbnail_url: impl Into<String>,
        media_url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail_url: thumbnail_url.into(),
            media_url: media_url.into(),
            category: category.into(),
        }
    }

    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail_url.is_empty()
    }
}

/// One category row of the grouped view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRow {
    /// Position of the row in first-seen order, used as the row header id
    pub index: usize,
    pub category: String,
    pub entries: Vec<Arc<VideoEntry>>,
}

impl CategoryRow {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Entries grouped by category
///
/// Rows appear in the order their category is first seen in the flat
/// catalogue sequence and each row keeps catalogue order. Categories are
/// never sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupedView {
    rows: Vec<CategoryRow>,
}

impl GroupedView {
    /// Group a flat sequence of entries by category
    pub fn from_entries(entries: &[Arc<VideoEntry>]) -> Self {
        let mut rows: Vec<CategoryRow> = Vec::new();

        for entry in entries {
            match rows.iter_mut().find(|row| row.category == entry.category) {
                Some(row) => row.entries.push(Arc::clone(entry)),
                None => rows.push(CategoryRow {
                    index: rows.len(),
                    category: entry.category.clone(),
                    entries: vec![Arc::clone(entry)],
                }),
            }
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[CategoryRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryRow> {
        self.rows.iter()
    }

    /// Entries of one category, `None` when the category does not exist
    pub fn get(&self, category: &str) -> Option<&[Arc<VideoEntry>]> {
        self.rows
            .iter()
            .find(|row| row.category == category)
            .map(|row| row.entries.as_slice())
    }

    /// Category names in row order
    pub fn categories(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.category.as_str()).collect()
    }

    /// Number of category rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of entries across all rows
    pub fn total_entries(&self) -> usize {
        self.rows.iter().map(CategoryRow::len).sum()
    }
}

impl<'a> IntoIterator for &'a GroupedView {
    type Item = &'a CategoryRow;
    type IntoIter = std::slice::Iter<'a, CategoryRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
