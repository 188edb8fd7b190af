//! Playback handoff
//!
//! A selected entry is copied into a [`PlaybackRequest`] and handed by value
//! to a [`PlaybackSurface`]. The surface owns everything about decoding and
//! rendering; this crate only validates the request and classifies the media
//! URL as a hint.

pub mod command;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::errors::{AppError, AppResult, PlaybackError, PlaybackResult};
use crate::models::VideoEntry;
use crate::repositories::CatalogueStore;
use crate::utils::url::UrlUtils;

pub use command::CommandPlaybackSurface;

/// Media delivery kind, derived from the URL path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A single progressive file such as MP4
    Progressive,
    /// An HLS `.m3u8` manifest
    HlsManifest,
}

impl MediaKind {
    pub fn from_url(url: &str) -> Self {
        match UrlUtils::path_extension(url).as_deref() {
            Some("m3u8") => MediaKind::HlsManifest,
            _ => MediaKind::Progressive,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Progressive => write!(f, "progressive"),
            MediaKind::HlsManifest => write!(f, "hls"),
        }
    }
}

/// Everything a player needs, copied out of the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackRequest {
    pub id: String,
    pub media_url: String,
    pub title: String,
    pub thumbnail_url: String,
    pub kind: MediaKind,
}

impl PlaybackRequest {
    /// Build a request from an entry
    ///
    /// Fails with [`PlaybackError::InvalidSelection`] when the media URL is
    /// empty or not absolute.
    ///
    /// ```rust
    /// use tvstream::models::VideoEntry;
    /// use tvstream::playback::{MediaKind, PlaybackRequest};
    ///
    /// let entry = VideoEntry::new("s1", "Bip Bop", "", "https://example.com/master.m3u8", "Sports");
    /// let request = PlaybackRequest::from_entry(&entry).unwrap();
    /// assert_eq!(request.kind, MediaKind::HlsManifest);
    /// ```
    pub fn from_entry(entry: &VideoEntry) -> PlaybackResult<Self> {
        let media_url = entry.media_url.trim();
        if media_url.is_empty() {
            return Err(PlaybackError::invalid_selection(&entry.id, "media URL is empty"));
        }
        UrlUtils::parse_and_validate(media_url)
            .map_err(|e| {
                PlaybackError::invalid_selection(&entry.id, format!("invalid media URL: {e}"))
            })?;

        Ok(Self {
            id: entry.id.clone(),
            media_url: media_url.to_string(),
            title: entry.title.clone(),
            thumbnail_url: entry.thumbnail_url.clone(),
            kind: MediaKind::from_url(media_url),
        })
    }
}

/// External player receiving playback requests
#[async_trait]
pub trait PlaybackSurface: Send + Sync {
    /// Hand a request to the player
    async fn play(&self, request: PlaybackRequest) -> PlaybackResult<()>;
}

/// Look up `id`, build its request and hand it to `surface`
///
/// A missing id is [`AppError::NotFound`].
pub async fn play_entry(
    store: &dyn CatalogueStore,
    surface: &dyn PlaybackSurface,
    id: &str,
) -> AppResult<PlaybackRequest> {
    let entry = store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("video", id))?;

    let request = PlaybackRequest::from_entry(&entry)?;
    info!("Handing '{}' ({}) to player as {}", request.title, request.id, request.kind);
    surface.play(request.clone()).await?;
    Ok(request)
}
