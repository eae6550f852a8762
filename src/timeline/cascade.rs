//! Deferred task collection for one step cascade
//!
//! Every sub-phase of a step is a task due at some point on the timeline
//! clock. Tasks run in `(due, seq)` order, so ties keep the order they were
//! scheduled in. Cancelling drops the whole collection and bumps the
//! generation; a task from an older generation never executes.

use serde::{Deserialize, Serialize};

use crate::duel::{CardSlot, EnvCard, SideState, ViewPair, ViewSide};
use crate::engine::Outcome;

/// One sub-phase of a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    /// Spawn both hands (latched)
    SpawnHands,
    /// Draw the top environment card
    DrawEnvironment(EnvCard),
    /// Reveal one card (latched). Blade carries its outcome.
    Reveal {
        side: ViewSide,
        slot: CardSlot,
        outcome: Option<Outcome>,
    },
    /// Terminal sub-phase of a blade reveal
    BladeResolved { side: ViewSide, outcome: Outcome },
    /// Count stats toward the step's resulting state
    UpdateStats {
        stats: ViewPair<SideState>,
        prev: ViewPair<SideState>,
    },
    /// Step done; move the cursor on
    Advance,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::SpawnHands => "spawn",
            Phase::DrawEnvironment(_) => "draw",
            Phase::Reveal { .. } => "reveal",
            Phase::BladeResolved { .. } => "blade-resolved",
            Phase::UpdateStats { .. } => "stats",
            Phase::Advance => "advance",
        }
    }
}

/// A phase and its offset from the start of the step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
    pub phase: Phase,
    /// Timeline milliseconds after the step begins (1.0x)
    pub at_ms: f64,
}

impl PhaseDescriptor {
    pub fn new(phase: Phase, at_ms: f64) -> Self {
        Self { phase, at_ms }
    }

    /// Real time until this phase fires at a playback speed
    #[inline]
    pub fn wall_delay_ms(&self, speed_factor: f64) -> f64 {
        self.at_ms / speed_factor
    }
}

/// Ordered descriptors for one step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StepPlan {
    pub index: usize,
    pub phases: Vec<PhaseDescriptor>,
}

impl StepPlan {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            phases: Vec::new(),
        }
    }

    pub fn push(&mut self, phase: Phase, at_ms: f64) {
        self.phases.push(PhaseDescriptor::new(phase, at_ms));
    }

    /// Offset of the last phase
    pub fn duration_ms(&self) -> f64 {
        self.phases.iter().map(|d| d.at_ms).fold(0.0, f64::max)
    }

    /// Offset of the first phase matching a predicate
    pub fn find(&self, pred: impl Fn(&Phase) -> bool) -> Option<f64> {
        self.phases.iter().find(|d| pred(&d.phase)).map(|d| d.at_ms)
    }
}

/// A scheduled phase
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub due: f64,
    pub seq: u64,
    pub generation: u32,
    pub phase: Phase,
}

/// The live task collection over a virtual clock
#[derive(Debug, Clone, Default)]
pub struct Cascade {
    now: f64,
    next_seq: u64,
    generation: u32,
    /// Sorted by `(due, seq)`
    tasks: Vec<Task>,
}

impl Cascade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline clock in milliseconds
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Schedule a phase `delay_ms` after the current clock
    pub fn schedule(&mut self, delay_ms: f64, phase: Phase) {
        let task = Task {
            due: self.now + delay_ms.max(0.0),
            seq: self.next_seq,
            generation: self.generation,
            phase,
        };
        self.next_seq += 1;
        // Equal due times keep insertion order
        let at = self.tasks.partition_point(|t| t.due <= task.due);
        self.tasks.insert(at, task);
    }

    /// Schedule a whole plan starting now
    pub fn schedule_plan(&mut self, plan: StepPlan) {
        for descriptor in plan.phases {
            self.schedule(descriptor.at_ms, descriptor.phase);
        }
    }

    /// Pop the earliest task due at or before `until`, moving the clock to it
    pub fn pop_due(&mut self, until: f64) -> Option<Task> {
        if self.tasks.first().is_some_and(|t| t.due <= until) {
            let task = self.tasks.remove(0);
            self.now = self.now.max(task.due);
            Some(task)
        } else {
            None
        }
    }

    /// Move the clock forward without running anything
    pub fn advance_to(&mut self, until: f64) {
        self.now = self.now.max(until);
    }

    /// Drop every outstanding task in one operation
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        self.generation = self.generation.wrapping_add(1);
        dropped
    }

    /// Whether a task belongs to the live generation
    #[inline]
    pub fn is_current(&self, task: &Task) -> bool {
        task.generation == self.generation
    }
}
