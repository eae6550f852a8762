//! Recording engine doubles for timeline tests

use crate::consts::*;
use crate::duel::{CardSlot, Hand};
use crate::engine::{HandEngine, Outcome};

#[derive(Debug, Clone, PartialEq)]
pub enum HandCall {
    Spawn,
    SetFaces,
    Reveal(CardSlot, Option<Outcome>),
    MarkOutcome(Outcome),
    Expand,
    Collapse,
    ShowDetails,
    HideDetails,
    Select(CardSlot),
    ReturnActive,
    Reset,
}

/// Hand engine that records calls and stays "busy" for as long as the
/// real engine would animate
#[derive(Debug, Clone, Default)]
pub struct RecordingHand {
    pub calls: Vec<HandCall>,
    busy_ms: f64,
    spawned: bool,
    details: bool,
}

impl RecordingHand {
    pub fn spawns(&self) -> usize {
        self.calls.iter().filter(|c| **c == HandCall::Spawn).count()
    }

    pub fn reveals(&self) -> Vec<CardSlot> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HandCall::Reveal(slot, _) => Some(*slot),
                _ => None,
            })
            .collect()
    }

    fn busy_for(&mut self, ms: f64) {
        self.busy_ms = self.busy_ms.max(ms);
    }
}

impl HandEngine for RecordingHand {
    fn spawn(&mut self, _hand: &Hand) {
        self.calls.push(HandCall::Spawn);
        self.spawned = true;
        self.busy_for(HAND_SPAWN_MS);
    }

    fn set_faces(&mut self, _hand: &Hand) {
        self.calls.push(HandCall::SetFaces);
    }

    fn reveal(&mut self, slot: CardSlot, outcome: Option<Outcome>) {
        self.calls.push(HandCall::Reveal(slot, outcome));
        self.details = false;
        self.busy_for(if slot == CardSlot::Blade {
            BLADE_SEQUENCE_MS
        } else {
            CARD_FLIP_MS
        });
    }

    fn mark_outcome(&mut self, outcome: Outcome) {
        self.calls.push(HandCall::MarkOutcome(outcome));
    }

    fn expand(&mut self) {
        self.calls.push(HandCall::Expand);
    }

    fn collapse(&mut self) {
        self.calls.push(HandCall::Collapse);
    }

    fn show_details(&mut self) {
        self.calls.push(HandCall::ShowDetails);
        self.details = true;
        self.busy_for(INSPECT_MS);
    }

    fn hide_details(&mut self) {
        self.calls.push(HandCall::HideDetails);
        self.details = false;
        self.busy_for(INSPECT_MS);
    }

    fn select(&mut self, slot: CardSlot) {
        self.calls.push(HandCall::Select(slot));
    }

    fn return_active_card(&mut self) {
        self.calls.push(HandCall::ReturnActive);
    }

    fn is_animating(&self) -> bool {
        self.busy_ms > 0.0
    }

    fn is_ready_to_show(&self) -> bool {
        self.spawned && !self.details && !self.is_animating()
    }

    fn is_ready_to_collapse(&self) -> bool {
        self.details && !self.is_animating()
    }

    fn reset(&mut self) {
        self.calls.push(HandCall::Reset);
        self.busy_ms = 0.0;
        self.spawned = false;
        self.details = false;
    }

    fn update(&mut self, dt_ms: f64) {
        self.busy_ms = (self.busy_ms - dt_ms).max(0.0);
    }
}
