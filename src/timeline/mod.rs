//! Presentation timeline
//!
//! - `cascade`: phases and the cancellable task collection
//! - `plan`: pure step planning (phase offsets)
//! - `sequencer`: latches, cursor and the scheduler loop
//! - `controller`: duel identity, side mapping and derived status

pub mod cascade;
pub mod controller;
pub mod plan;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod doubles;

pub use cascade::{Cascade, Phase, PhaseDescriptor, StepPlan};
pub use controller::{DuelSession, TimelineController};
pub use plan::plan_step;
pub use sequencer::{LatchSet, PlaybackCursor, StepSequencer, TimelineEvent};
