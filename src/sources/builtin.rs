//! Built-in sample catalogue
//!
//! Twelve public sample videos in three categories. Thumbnails come from a
//! stable no-auth image CDN; media URLs are a mix of progressive MP4 files and
//! HLS manifests.

use crate::catalogue::Catalogue;
use crate::errors::CatalogueResult;
use crate::models::VideoEntry;

const SAMPLE_BUCKET: &str = "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample";
const HLS_EXAMPLES: &str = "https://devstreaming-cdn.apple.com/videos/streaming/examples";

/// (id, title, thumbnail seed, media URL, category)
const SAMPLES: [(&str, &str, &str, &str, &str); 12] = [
    ("m1", "Big Buck Bunny", "bunny", "BigBuckBunny.mp4", "Movies"),
    ("m2", "Elephant Dream", "elephant", "ElephantsDream.mp4", "Movies"),
    ("m3", "For Bigger Blazes", "blazes", "ForBiggerBlazes.mp4", "Movies"),
    ("m4", "Subaru Outback", "subaru", "SubaruOutbackOnStreetAndDirt.mp4", "Movies"),
    ("s1", "Weeknd Blinding Lights (HLS)", "sports1", "hls:bipbop_4x3/bipbop_4x3_variant.m3u8", "Sports"),
    ("s2", "For Bigger Escapes", "escapes", "ForBiggerEscapes.mp4", "Sports"),
    ("s3", "For Bigger Fun", "fun", "ForBiggerFun.mp4", "Sports"),
    ("s4", "Apple HLS 4K Stream", "hls4k", "hls:img_bipbop_adv_example_fmp4/master.m3u8", "Sports"),
    ("n1", "Tears of Steel", "steel", "TearsOfSteel.mp4", "News"),
    ("n2", "Volkswagen GTI", "vw", "VolkswagenGTIReview.mp4", "News"),
    ("n3", "We Are Going On Bullrun", "bullrun", "WeAreGoingOnBullrun.mp4", "News"),
    ("n4", "What Care Can You Get", "carget", "WhatCarCanYouGetForAGrand.mp4", "News"),
];

fn media_url(path: &str) -> String {
    match path.strip_prefix("hls:") {
        Some(manifest) => format!("{HLS_EXAMPLES}/{manifest}"),
        None => format!("{SAMPLE_BUCKET}/{path}"),
    }
}

/// Sample entries in catalogue order
pub fn builtin_entries() -> Vec<VideoEntry> {
    SAMPLES
        .iter()
        .map(|&(id, title, seed, path, category)| {
            VideoEntry::new(
                id,
                title,
                format!("https://picsum.photos/seed/{seed}/320/180"),
                media_url(path),
                category,
            )
        })
        .collect()
}

/// The sample catalogue, validated
pub fn builtin_catalogue() -> CatalogueResult<Catalogue> {
    Catalogue::new(builtin_entries())
}
