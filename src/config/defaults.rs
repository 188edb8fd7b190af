/// Configuration default values
///
/// All default values for configuration options, kept in one place.

// Catalogue defaults
pub const DEFAULT_SOURCE: &str = "builtin";
pub const DEFAULT_LOAD_TIMEOUT: &str = "10s";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "30s";

// Player defaults
pub const DEFAULT_PLAYER_COMMAND: &str = "mpv";
pub const DEFAULT_PLAYER_ARGS: [&str; 2] = ["--force-media-title={title}", "{url}"];

// Display defaults
pub const DEFAULT_GRID_COLUMNS: usize = 2;

// Watch defaults
pub const DEFAULT_WATCH_INTERVAL: &str = "30s";
