//! Configuration constants for the clue board
//!
//! This module contains the limits and fixed values used throughout the
//! session controller and the document model.

/// Board layout constants
pub mod board {
    /// The canonical point ladder, one board row per tier
    pub const VALUE_TIERS: [i64; 5] = [200, 400, 600, 800, 1000];
    /// Maximum length of a game or category title in characters
    pub const MAX_TITLE_LENGTH: usize = 255;
}

/// Countdown constants for a revealed clue
pub mod timer {
    /// Default number of seconds players get before the response is revealed
    pub const DEFAULT_SECONDS: u64 = 30;
    /// Minimum configurable countdown in seconds
    pub const MIN_SECONDS: u64 = 5;
    /// Maximum configurable countdown in seconds
    pub const MAX_SECONDS: u64 = 240;
}

/// Player roster constants
pub mod roster {
    /// Number of players required by the fixed roster policy
    pub const FIXED_SIZE: usize = 3;
    /// Maximum length of a player name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
    /// Maximum number of local players around one board
    pub const MAX_PLAYER_COUNT: usize = 12;
}
