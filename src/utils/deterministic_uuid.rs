//! Deterministic UUID Generation
//!
//! Playlist entries without an explicit id still need a stable identity key so
//! that presentation adapters keep their selection across refreshes. The same
//! inputs always produce the same UUID.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Generate a deterministic UUID based on hashable inputs
pub fn generate_deterministic_uuid(inputs: &[&dyn std::fmt::Display]) -> Uuid {
    let mut hasher = DefaultHasher::new();

    for input in inputs {
        input.to_string().hash(&mut hasher);
    }

    let hash = hasher.finish();

    // DefaultHasher produces u64; repeat it to fill the 128 bits
    let uuid_bits = ((hash as u128) << 64) | (hash as u128);
    Uuid::from_u128(uuid_bits)
}

/// Generate a stable entry id from its media URL and title
///
/// ```rust
/// use tvstream::utils::generate_entry_id;
///
/// let a = generate_entry_id("https://example.com/a.mp4", "A");
/// let b = generate_entry_id("https://example.com/a.mp4", "A");
/// assert_eq!(a, b);
/// ```
pub fn generate_entry_id(media_url: &str, title: &str) -> String {
    generate_deterministic_uuid(&[&media_url, &title]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_uuid_consistency() {
        let url = "https://example.com/stream.m3u8";
        let first = generate_entry_id(url, "Test Channel");
        let second = generate_entry_id(url, "Test Channel");
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_different_inputs_different_ids() {
        let url = "https://example.com/stream.m3u8";
        assert_ne!(
            generate_entry_id(url, "Channel One"),
            generate_entry_id(url, "Channel Two")
        );
        assert_ne!(
            generate_entry_id("https://example.com/a.m3u8", "Same"),
            generate_entry_id("https://example.com/b.m3u8", "Same")
        );
    }
}
