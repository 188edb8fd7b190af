//! Extended M3U playlist decoding
//!
//! Playlists are read as a flat catalogue: each `#EXTINF` line followed by a
//! stream URL becomes one entry.
//!
//! ```text
//! #EXTM3U
//! #EXTINF:-1 tvg-id="m1" tvg-logo="https://img/m1.jpg" group-title="Movies",Big Buck Bunny
//! https://cdn.example.com/BigBuckBunny.mp4
//! ```
//!
//! `group-title` maps to the category, `tvg-logo` to the thumbnail and
//! `tvg-id` to the entry id. Entries without `tvg-id` get a deterministic id
//! derived from their URL and title.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::errors::{CatalogueError, CatalogueResult};
use crate::models::VideoEntry;
use crate::utils::generate_entry_id;
use crate::utils::url::UrlUtils;

/// Category used for entries without a `group-title`
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Metadata collected from an `#EXTINF` line, waiting for its URL line
#[derive(Debug, Default)]
struct PendingEntry {
    title: String,
    attributes: HashMap<String, String>,
}

/// Parse playlist text into catalogue entries in playlist order
///
/// Duplicate `(url, title)` pairs are skipped. A `tvg-id` already taken by an
/// earlier entry is replaced with a generated id. A URL line without a preceding
/// `#EXTINF` becomes an entry named after the last URL path segment.
pub fn parse_playlist(content: &str) -> CatalogueResult<Vec<VideoEntry>> {
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;
    let mut seen = HashSet::new();
    let mut used_ids = HashSet::new();
    let mut duplicate_count = 0usize;

    for (line_num, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(extinf) = line.strip_prefix("#EXTINF:") {
            if pending.is_some() {
                warn!("EXTINF before line {} has no stream URL, discarding", line_num + 1);
            }
            pending = Some(parse_extinf(extinf).map_err(|message| {
                CatalogueError::parse("m3u", format!("line {}: {}", line_num + 1, message))
            })?);
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let mut entry = match pending.take() {
            Some(metadata) => complete_entry(metadata, line),
            None => {
                warn!("Found stream URL without EXTINF metadata at line {}", line_num + 1);
                basic_entry(line)
            }
        };

        if !seen.insert(format!("{}|{}", entry.media_url, entry.title)) {
            duplicate_count += 1;
            debug!("Skipping duplicate entry '{}' at line {}", entry.title, line_num + 1);
            continue;
        }

        if !used_ids.insert(entry.id.clone()) {
            let fallback = generate_entry_id(&entry.media_url, &entry.title);
            warn!(
                "Entry id '{}' at line {} is already used, falling back to {}",
                entry.id,
                line_num + 1,
                fallback
            );
            entry.id = fallback;
            used_ids.insert(entry.id.clone());
        }
        entries.push(entry);
    }

    if duplicate_count > 0 {
        info!("Removed {} duplicate playlist entries", duplicate_count);
    }
    debug!("Parsed {} entries from playlist", entries.len());

    Ok(entries)
}

/// Parse the part of an EXTINF line after `#EXTINF:`
///
/// Format: `<duration> key="value" key2=value2,<title>`. The title starts at
/// the first comma outside a quoted attribute value.
fn parse_extinf(extinf: &str) -> Result<PendingEntry, String> {
    let comma_pos = find_title_separator(extinf).ok_or("invalid EXTINF format: missing comma")?;
    let (head, title) = extinf.split_at(comma_pos);
    let title = title[1..].trim();

    // First token is the duration; attributes follow it
    let attributes_part = head
        .trim_start()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest)
        .unwrap_or("");

    Ok(PendingEntry {
        title: title.to_string(),
        attributes: parse_attributes(attributes_part),
    })
}

fn find_title_separator(extinf: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (pos, ch) in extinf.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some(pos),
            _ => {}
        }
    }
    None
}

/// Parse `key="value"` and `key=value` pairs
fn parse_attributes(input: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        if key.is_empty() && chars.peek().is_none() {
            break;
        }
        if chars.next_if_eq(&'=').is_none() {
            // Bare token without a value
            if chars.peek().is_none() {
                break;
            }
            continue;
        }

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                value.push(c);
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }

        if !key.is_empty() {
            attributes.insert(key.to_ascii_lowercase(), value);
        }
    }

    attributes
}

fn complete_entry(metadata: PendingEntry, url: &str) -> VideoEntry {
    let PendingEntry { title, attributes } = metadata;
    let non_empty = |key: &str| {
        attributes
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let title = if title.is_empty() {
        non_empty("tvg-name")
            .or_else(|| UrlUtils::last_path_segment(url))
            .unwrap_or_else(|| url.to_string())
    } else {
        title
    };

    VideoEntry {
        id: non_empty("tvg-id").unwrap_or_else(|| generate_entry_id(url, &title)),
        thumbnail_url: non_empty("tvg-logo").unwrap_or_default(),
        category: non_empty("group-title").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        media_url: url.to_string(),
        title,
    }
}

fn basic_entry(url: &str) -> VideoEntry {
    let title = UrlUtils::last_path_segment(url).unwrap_or_else(|| url.to_string());
    VideoEntry {
        id: generate_entry_id(url, &title),
        thumbnail_url: String::new(),
        media_url: url.to_string(),
        category: DEFAULT_CATEGORY.to_string(),
        title,
    }
}
