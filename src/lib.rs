//! Duel Replay - presentation timeline for turn-based duel logs
//!
//! Core modules:
//! - `duel`: Immutable duel data (steps, hands, sides) and the source contract
//! - `anim`: Card unit animation primitive (tweens, counters)
//! - `engine`: Hand and deck engines driving card units
//! - `timeline`: Step sequencer, cascade scheduler and timeline controller
//! - `settings`: Playback preferences

pub mod anim;
pub mod duel;
pub mod engine;
pub mod error;
pub mod settings;
pub mod timeline;

pub use error::{ReplayError, Result};
pub use settings::{PlaybackSettings, SpeedPreset};
pub use timeline::{PlaybackCursor, StepSequencer, TimelineController, TimelineEvent};

/// Timing and layout constants
///
/// Durations are timeline milliseconds at 1.0x; the speed factor scales them
/// all uniformly. Positions are world units with the table center at origin.
pub mod consts {
    /// Stats
    pub const FULL_HEALTH: u8 = 3;
    pub const INITIAL_DAMAGE: u8 = 1;
    pub const INITIAL_HIT_CHANCE: u8 = 50;

    /// Hand spawn: stagger between cards, then fade/fan in
    pub const HAND_SPAWN_STAGGER_MS: f64 = 80.0;
    pub const HAND_SPAWN_MS: f64 = 900.0;
    /// Deck draw: lift, travel, land
    pub const DECK_DRAW_LIFT_MS: f64 = 250.0;
    pub const DECK_DRAW_TRAVEL_MS: f64 = 400.0;
    pub const DECK_DRAW_LAND_MS: f64 = 250.0;
    pub const DECK_DRAW_MS: f64 = DECK_DRAW_LIFT_MS + DECK_DRAW_TRAVEL_MS + DECK_DRAW_LAND_MS;
    /// Face-up flip and move to the result row
    pub const CARD_FLIP_MS: f64 = 500.0;
    /// Pause between the tactics/fire/dodge pair and the blade reveal
    pub const BLADE_SETTLE_MS: f64 = 700.0;
    /// Blade sequence: approach, clash, outcome flourish
    pub const BLADE_APPROACH_MS: f64 = 450.0;
    pub const BLADE_CLASH_MS: f64 = 500.0;
    pub const BLADE_OUTCOME_MS: f64 = 650.0;
    pub const BLADE_SEQUENCE_MS: f64 = BLADE_APPROACH_MS + BLADE_CLASH_MS + BLADE_OUTCOME_MS;
    /// Gap between the last reveal finishing and the stat update
    pub const STAT_SETTLE_MS: f64 = 200.0;
    /// Stat numbers count over this long
    pub const STAT_TWEEN_MS: f64 = 600.0;
    /// Hold after stats before advancing
    pub const STEP_HOLD_MS: f64 = 800.0;
    /// Expand/collapse/details transitions
    pub const INSPECT_MS: f64 = 350.0;
    /// Cosmetic shuffle: split apart, then merge back
    pub const SHUFFLE_SPLIT_MS: f64 = 300.0;
    pub const SHUFFLE_MERGE_MS: f64 = 400.0;

    /// Hands sit this far from center (mirrored per side)
    pub const HAND_OFFSET_X: f32 = 6.0;
    pub const HAND_REST_Y: f32 = -3.0;
    pub const HAND_SPACING: f32 = 1.1;
    pub const HAND_EXPAND_SPACING: f32 = 1.6;
    /// Fan rotation per card from the middle (radians)
    pub const HAND_FAN_ANGLE: f32 = 0.12;
    /// Below the table, where hands start and reset to
    pub const OFFSCREEN_Y: f32 = -8.0;
    /// Revealed cards line up here
    pub const RESULT_OFFSET_X: f32 = 3.0;
    pub const RESULT_Y: f32 = -0.5;
    /// Blades meet this far from center
    pub const CLASH_OFFSET_X: f32 = 0.7;
    /// Details grid
    pub const DETAILS_OFFSET_X: f32 = 4.0;
    pub const DETAILS_Y: f32 = 0.5;
    pub const DETAILS_SPACING: f32 = 1.8;
    pub const DETAILS_SCALE: f32 = 1.4;
    /// Active (enlarged, centered) card
    pub const ACTIVE_SCALE: f32 = 2.4;
    pub const ACTIVE_Z: f32 = 2.0;

    /// Environment deck
    pub const DECK_X: f32 = 0.0;
    pub const DECK_Y: f32 = 3.5;
    pub const DECK_CARD_THICKNESS: f32 = 0.02;
    pub const DECK_LIFT: f32 = 1.0;
    pub const DECK_SPLIT_X: f32 = 1.2;
    pub const DRAWN_ROW_X0: f32 = -4.5;
    pub const DRAWN_ROW_Y: f32 = 3.5;
    pub const DRAWN_SPACING: f32 = 1.0;
    pub const INSPECT_ROW_Y: f32 = 0.0;
    pub const INSPECT_SPACING: f32 = 1.6;
    pub const INSPECT_SCALE: f32 = 1.5;
}
