//! Validated, immutable video catalogue
//!
//! A [`Catalogue`] is the canonical ordered list of entries plus an id index.
//! It is built once, never mutated, and cheap to clone; every store hands the
//! projector one of these so grouped and flat views always derive from the
//! same snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{CatalogueError, CatalogueResult};
use crate::models::{GroupedView, VideoEntry};
use crate::utils::url::UrlUtils;

#[derive(Debug)]
struct CatalogueInner {
    entries: Vec<Arc<VideoEntry>>,
    index: HashMap<String, usize>,
}

/// Canonical ordered list of catalogue entries
#[derive(Debug, Clone)]
pub struct Catalogue {
    inner: Arc<CatalogueInner>,
}

impl Catalogue {
    /// Build a catalogue, validating every entry
    ///
    /// Fails on duplicate ids, empty required fields, a media URL that is not
    /// absolute, or a non-empty thumbnail URL that is not absolute.
    pub fn new(entries: Vec<VideoEntry>) -> CatalogueResult<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        let mut shared = Vec::with_capacity(entries.len());

        for (position, entry) in entries.into_iter().enumerate() {
            validate_entry(&entry)?;
            if index.insert(entry.id.clone(), position).is_some() {
                return Err(CatalogueError::DuplicateId { id: entry.id });
            }
            shared.push(Arc::new(entry));
        }

        Ok(Self {
            inner: Arc::new(CatalogueInner {
                entries: shared,
                index,
            }),
        })
    }

    pub fn empty() -> Self {
        Self {
            inner: Arc::new(CatalogueInner {
                entries: Vec::new(),
                index: HashMap::new(),
            }),
        }
    }

    /// Entries in canonical order
    pub fn entries(&self) -> &[Arc<VideoEntry>] {
        &self.inner.entries
    }

    /// Every entry in canonical order
    pub fn all(&self) -> Vec<Arc<VideoEntry>> {
        self.inner.entries.clone()
    }

    /// Entries grouped by first-seen category
    pub fn grouped(&self) -> GroupedView {
        GroupedView::from_entries(&self.inner.entries)
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Option<Arc<VideoEntry>> {
        self.inner
            .index
            .get(id)
            .map(|&position| Arc::clone(&self.inner.entries[position]))
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::empty()
    }
}

fn validate_entry(entry: &VideoEntry) -> CatalogueResult<()> {
    let missing = |field: &'static str| CatalogueError::MissingField {
        id: entry.id.clone(),
        field,
    };

    if entry.id.trim().is_empty() {
        return Err(missing("id"));
    }
    if entry.title.trim().is_empty() {
        return Err(missing("title"));
    }
    if entry.category.trim().is_empty() {
        return Err(missing("category"));
    }
    if entry.media_url.trim().is_empty() {
        return Err(missing("media_url"));
    }

    check_url(entry, "media_url", &entry.media_url)?;
    if entry.has_thumbnail() {
        check_url(entry, "thumbnail_url", &entry.thumbnail_url)?;
    }

    Ok(())
}

fn check_url(entry: &VideoEntry, field: &'static str, url: &str) -> CatalogueResult<()> {
    UrlUtils::parse_and_validate(url)
        .map(|_| ())
        .map_err(|e| CatalogueError::InvalidUrl {
            id: entry.id.clone(),
            field,
            url: url.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MEDIA: &str = "https://cdn.example.com/a.mp4";

    fn entry(id: &str, category: &str) -> VideoEntry {
        VideoEntry::new(
            id,
            format!("Title {id}"),
            format!("https://img.example.com/{id}.jpg"),
            format!("https://cdn.example.com/{id}.mp4"),
            category,
        )
    }

    #[test]
    fn test_concrete_grouping_scenario() {
        let catalogue = Catalogue::new(vec![
            entry("m1", "Movies"),
            entry("s1", "Sports"),
            entry("m2", "Movies"),
        ])
        .unwrap();

        let grouped = catalogue.grouped();
        assert_eq!(grouped.categories(), vec!["Movies", "Sports"]);
        let movie_ids: Vec<&str> = grouped
            .get("Movies")
            .unwrap()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(movie_ids, vec!["m1", "m2"]);
        let sport_ids: Vec<&str> = grouped
            .get("Sports")
            .unwrap()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(sport_ids, vec!["s1"]);
    }

    #[test]
    fn test_get_by_id() {
        let catalogue = Catalogue::new(vec![entry("m1", "Movies"), entry("s1", "Sports")]).unwrap();

        assert_eq!(catalogue.get("s1").unwrap().category, "Sports");
        assert!(catalogue.get("missing").is_none());
        // Repeated lookups are stable
        assert!(catalogue.get("missing").is_none());
        assert_eq!(catalogue.get("m1"), catalogue.get("m1"));
    }

    #[test]
    fn test_empty_catalogue() {
        let catalogue = Catalogue::empty();
        assert!(catalogue.all().is_empty());
        assert!(catalogue.grouped().is_empty());
        assert!(catalogue.get("m1").is_none());
        assert_eq!(catalogue.len(), 0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = Catalogue::new(vec![entry("m1", "Movies"), entry("m1", "Sports")]);
        assert!(matches!(result, Err(CatalogueError::DuplicateId { id }) if id == "m1"));
    }

    #[rstest]
    #[case::empty_id(VideoEntry::new("", "T", "", MEDIA, "Movies"), "id")]
    #[case::empty_title(VideoEntry::new("a", " ", "", MEDIA, "Movies"), "title")]
    #[case::empty_category(VideoEntry::new("a", "T", "", MEDIA, ""), "category")]
    #[case::empty_media(VideoEntry::new("a", "T", "", "", "Movies"), "media_url")]
    fn test_missing_fields_rejected(#[case] bad: VideoEntry, #[case] expected: &str) {
        match Catalogue::new(vec![bad]) {
            Err(CatalogueError::MissingField { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected MissingField({expected}), got {other:?}"),
        }
    }

    #[rstest]
    #[case::relative_media(VideoEntry::new("a", "T", "", "videos/a.mp4", "Movies"), "media_url")]
    #[case::relative_thumbnail(
        VideoEntry::new("a", "T", "thumbs/a.jpg", MEDIA, "Movies"),
        "thumbnail_url"
    )]
    fn test_invalid_urls_rejected(#[case] bad: VideoEntry, #[case] expected: &str) {
        match Catalogue::new(vec![bad]) {
            Err(CatalogueError::InvalidUrl { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected InvalidUrl({expected}), got {other:?}"),
        }
    }

    #[test]
    fn test_missing_thumbnail_is_allowed() {
        let catalogue = Catalogue::new(vec![VideoEntry::new(
            "a",
            "T",
            "",
            "https://cdn.example.com/a.m3u8",
            "Live",
        )])
        .unwrap();
        assert!(!catalogue.get("a").unwrap().has_thumbnail());
    }

    #[test]
    fn test_clone_shares_entries() {
        let catalogue = Catalogue::new(vec![entry("m1", "Movies")]).unwrap();
        let copy = catalogue.clone();
        assert!(Arc::ptr_eq(&catalogue.entries()[0], &copy.entries()[0]));
    }
}
