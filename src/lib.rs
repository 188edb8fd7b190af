pub mod catalogue;
pub mod config;
pub mod errors;
pub mod models;
pub mod playback;
pub mod projector;
pub mod repositories;
pub mod sources;
pub mod utils;
