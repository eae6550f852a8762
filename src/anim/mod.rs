//! Animation primitives
//!
//! Thin and replaceable: tweens over a unit pose, the card unit that queues
//! them, and counters for stat numbers. No game logic lives here.

pub mod card_unit;
pub mod counter;
pub mod tween;

pub use card_unit::{CardUnit, Highlight};
pub use counter::{AnimatedStat, StatsDisplay};
pub use tween::{Easing, Keyframe, Pose, Transform, Tween};
