//! Narrative stages for status displays

use serde::{Deserialize, Serialize};

/// Where playback of the current duel stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelStage {
    /// No duel selected, or the step log has not arrived yet
    Loading,
    /// Steps loaded, nothing animated yet and not playing
    Ready,
    /// A step cascade is running
    Animating { step: usize },
    /// Between steps with playback paused
    Paused { step: usize },
    /// Every step has been animated
    Finished,
    /// A side withdrew or abandoned; terminal state shown directly
    Withdrawn,
}

/// Monotonic record of how far one side has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletedStages {
    /// Hand is known (committed and revealed by the log)
    pub committed: bool,
    /// Hand has been spawned on screen
    pub revealed: bool,
    /// The duel outcome has been shown
    pub resolved: bool,
}

impl CompletedStages {
    /// Raise to include everything in `other`. Never lowers a flag.
    pub fn merge(&mut self, other: CompletedStages) {
        self.committed |= other.committed;
        self.revealed |= other.revealed;
        self.resolved |= other.resolved;
    }
}
