//! Snake Presenter - presentation layer for a networked snake client
//!
//! Core modules:
//! - `snapshot`: Authoritative state records and the latest/previous buffer
//! - `transitions`: Edge detection between consecutive snapshots
//! - `effects`: Client-only, time-bounded visual entities
//! - `message`: Single transient message overlay timeline
//! - `renderer`: Frame composition and drawing surface abstraction
//! - `audio`: Procedural sound cues for detected transitions
//! - `engine`: Ties everything together per network message and render tick
//! - `persistence`: Key/value storage (LocalStorage on web)

pub mod audio;
pub mod best_score;
pub mod commands;
pub mod effects;
pub mod engine;
pub mod message;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod snapshot;
pub mod transitions;

pub use best_score::BestScore;
pub use engine::PresentationEngine;
pub use settings::{QualityPreset, Settings};
pub use snapshot::{GridPoint, Snapshot};
pub use transitions::TransitionEvent;

use glam::Vec2;

/// Presentation constants
pub mod consts {
    /// Board size in cells (matches the server's board)
    pub const BOARD_COLS: i32 = 25;
    pub const BOARD_ROWS: i32 = 25;
    /// Pixel size of one grid cell
    pub const CELL_SIZE: f32 = 20.0;

    /// Explosion lifetime (ms)
    pub const EXPLOSION_MS: f64 = 500.0;
    /// Explosion final radius, in cells
    pub const EXPLOSION_RADIUS_CELLS: f32 = 1.5;
    /// Floating score label lifetime (ms)
    pub const FLOATING_SCORE_MS: f64 = 1000.0;
    /// How far a score label rises over its lifetime (px)
    pub const FLOATING_SCORE_RISE: f32 = 40.0;
    /// Confetti lifetime range (ms)
    pub const CONFETTI_MIN_MS: f64 = 2000.0;
    pub const CONFETTI_MAX_MS: f64 = 3000.0;
    /// Confetti gravity (px/s²)
    pub const CONFETTI_GRAVITY: f32 = 420.0;

    /// Foods start pulsing / show a countdown ring at or below this many seconds
    pub const FOOD_WARNING_SECS: i32 = 5;

    /// Delay before reconnecting a dropped socket (ms)
    pub const RECONNECT_DELAY_MS: i32 = 3000;
}

/// Top-left pixel of a grid cell
#[inline]
pub fn cell_origin(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 * consts::CELL_SIZE, y as f32 * consts::CELL_SIZE)
}

/// Pixel center of a grid cell
#[inline]
pub fn cell_center(x: i32, y: i32) -> Vec2 {
    cell_origin(x, y) + Vec2::splat(consts::CELL_SIZE / 2.0)
}
