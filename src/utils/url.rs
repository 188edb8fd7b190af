//! URL utilities for consistent URL handling
//!
//! Validation and log-safe rendering of the thumbnail, media and source URLs
//! that flow through the catalogue.

use url::Url;

/// Query parameters whose values are hidden when a URL is logged
const SENSITIVE_PARAMS: [&str; 7] = [
    "username", "password", "user", "pass", "pwd", "passwd", "token",
];

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Parse and validate an absolute URL
    ///
    /// # Arguments
    ///
    /// * `url` - The URL string to validate
    ///
    /// # Returns
    ///
    /// * `Ok(Url)` - Successfully parsed URL
    /// * `Err(url::ParseError)` - Parse error, including relative URLs
    pub fn parse_and_validate(url: &str) -> Result<Url, url::ParseError> {
        Url::parse(url.trim())
    }

    /// Check whether a location string refers to a remote HTTP(S) resource
    pub fn is_http(location: &str) -> bool {
        Self::parse_and_validate(location)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Extract the last non-empty path segment of a URL
    ///
    /// Used to name playlist entries that carry no title.
    pub fn last_path_segment(url: &str) -> Option<String> {
        let parsed = Self::parse_and_validate(url).ok()?;
        parsed
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(|segment| segment.to_string())
    }

    /// Lowercased file extension of the URL path, if any
    pub fn path_extension(location: &str) -> Option<String> {
        let path = match Self::parse_and_validate(location) {
            Ok(url) => url.path().to_string(),
            Err(_) => location.to_string(),
        };
        let file_name = path.rsplit('/').next()?;
        let (_, extension) = file_name.rsplit_once('.')?;
        if extension.is_empty() {
            None
        } else {
            Some(extension.to_ascii_lowercase())
        }
    }

    /// Hide credentials embedded in a URL so it can be logged
    ///
    /// Both `user:pass@host` authority credentials and well-known credential
    /// query parameters are replaced with `****`. Strings that do not parse are
    /// returned unchanged.
    pub fn obfuscate_credentials(url: &str) -> String {
        let Ok(mut parsed) = Url::parse(url) else {
            return url.to_string();
        };

        if !parsed.username().is_empty() || parsed.password().is_some() {
            let _ = parsed.set_username("****");
            let _ = parsed.set_password(Some("****"));
        }

        let has_sensitive = parsed
            .query_pairs()
            .any(|(key, _)| Self::is_sensitive_param(&key));
        if has_sensitive {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(key, value)| {
                    if Self::is_sensitive_param(&key) {
                        (key.into_owned(), "****".to_string())
                    } else {
                        (key.into_owned(), value.into_owned())
                    }
                })
                .collect();
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
        }

        parsed.to_string()
    }

    fn is_sensitive_param(key: &str) -> bool {
        SENSITIVE_PARAMS
            .iter()
            .any(|param| key.eq_ignore_ascii_case(param))
    }
}
