//! Catalogue sources
//!
//! Decoding of catalogue documents and the built-in sample catalogue.
//!
//! Two document formats are understood:
//! - **JSON**: a bare array of entries or `{ "videos": [...] }`
//! - **M3U**: extended playlists with `group-title`, `tvg-logo` and `tvg-id`
//!
//! Stores fetch raw text and hand it to [`decode`], which picks the format
//! from the configured [`SourceFormat`] and, for `auto`, from the location and
//! content via [`CatalogueFormat::detect`].

pub mod builtin;
pub mod json;
pub mod m3u;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::catalogue::Catalogue;
use crate::errors::CatalogueResult;
use crate::utils::url::UrlUtils;

pub use builtin::{builtin_catalogue, builtin_entries};

/// Concrete document format of a catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogueFormat {
    Json,
    M3u,
}

impl CatalogueFormat {
    /// Guess the format of a document
    ///
    /// A `.m3u`/`.m3u8` extension or a leading `#EXTM3U` line selects M3U;
    /// anything else is treated as JSON.
    ///
    /// ```rust
    /// use tvstream::sources::CatalogueFormat;
    ///
    /// assert_eq!(CatalogueFormat::detect("list.m3u", ""), CatalogueFormat::M3u);
    /// assert_eq!(CatalogueFormat::detect("https://example.com/get", "#EXTM3U\n"), CatalogueFormat::M3u);
    /// assert_eq!(CatalogueFormat::detect("catalogue.json", "[]"), CatalogueFormat::Json);
    /// ```
    pub fn detect(location: &str, content: &str) -> Self {
        if let Some(extension) = UrlUtils::path_extension(location) {
            match extension.as_str() {
                "m3u" | "m3u8" => return Self::M3u,
                "json" => return Self::Json,
                _ => {}
            }
        }

        let first_line = content
            .trim_start_matches('\u{feff}')
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");
        if first_line.starts_with("#EXTM3U") || first_line.starts_with("#EXTINF") {
            Self::M3u
        } else {
            Self::Json
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::M3u => "m3u",
        }
    }
}

impl fmt::Display for CatalogueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured format of a catalogue source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Detect from the location and content
    #[default]
    Auto,
    Json,
    M3u,
}

impl SourceFormat {
    /// Resolve to a concrete format, detecting when set to `auto`
    pub fn resolve(self, location: &str, content: &str) -> CatalogueFormat {
        match self {
            Self::Auto => CatalogueFormat::detect(location, content),
            Self::Json => CatalogueFormat::Json,
            Self::M3u => CatalogueFormat::M3u,
        }
    }
}

/// Decode a fetched document and validate it into a [`Catalogue`]
pub fn decode(location: &str, content: &str, format: SourceFormat) -> CatalogueResult<Catalogue> {
    let format = format.resolve(location, content);
    debug!(
        "Decoding {} bytes from {} as {}",
        content.len(),
        UrlUtils::obfuscate_credentials(location),
        format
    );

    let entries = match format {
        CatalogueFormat::Json => json::parse_document(content)?,
        CatalogueFormat::M3u => m3u::parse_playlist(content)?,
    };

    Catalogue::new(entries)
}
