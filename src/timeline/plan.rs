//! Step planning
//!
//! A pure function from one step (plus the state before it) to the ordered
//! list of phases and their offsets. The sequencer never decides timing on
//! its own; it only interprets plans.

use super::cascade::{Phase, StepPlan};
use crate::consts::*;
use crate::duel::{CardSlot, DuelStep, SideMapping, SideState, ViewPair, ViewSide};
use crate::engine::Outcome;

/// Blade outcome for a side, from its health before and after the step
pub fn blade_outcome(prev: SideState, next: SideState) -> Outcome {
    if prev.health > 0 && next.health == 0 {
        Outcome::Defeat
    } else {
        Outcome::Victory
    }
}

/// Stats of both sides after a step, in viewer space
pub fn view_states(step: &DuelStep, mapping: SideMapping) -> ViewPair<SideState> {
    ViewPair::from_data(mapping, step.side_a.state, step.side_b.state)
}

/// Stats before step `index`
pub fn prev_states(steps: &[DuelStep], index: usize, mapping: SideMapping) -> ViewPair<SideState> {
    match index.checked_sub(1).and_then(|i| steps.get(i)) {
        Some(prev) => view_states(prev, mapping),
        None => ViewPair::new(SideState::INITIAL, SideState::INITIAL),
    }
}

/// Plan one step.
///
/// Order: spawn (first step only) → draw → tactics and fire/dodge together
/// → blade after a settle → blade resolved → stats → advance.
pub fn plan_step(
    index: usize,
    step: &DuelStep,
    prev: ViewPair<SideState>,
    mapping: SideMapping,
) -> StepPlan {
    let mut plan = StepPlan::new(index);
    let next = view_states(step, mapping);
    let mut t = 0.0;

    if index == 0 {
        plan.push(Phase::SpawnHands, t);
        t += HAND_SPAWN_MS;
    }

    if let Some(card) = step.environment_card {
        plan.push(Phase::DrawEnvironment(card), t);
        t += DECK_DRAW_MS;
    }

    let played = |side: ViewSide, slot: CardSlot| step.side(mapping.to_data(side)).played(slot);

    let pair_at = t;
    let mut any_pair = false;
    for side in ViewSide::BOTH {
        for slot in CardSlot::ALL.into_iter().filter(|s| s.reveals_in_pair()) {
            if played(side, slot) {
                plan.push(
                    Phase::Reveal {
                        side,
                        slot,
                        outcome: None,
                    },
                    pair_at,
                );
                any_pair = true;
            }
        }
    }
    let mut reveal_end = if any_pair { pair_at + CARD_FLIP_MS } else { pair_at };

    let blades: Vec<(ViewSide, Outcome)> = ViewSide::BOTH
        .into_iter()
        .filter(|&side| played(side, CardSlot::Blade))
        .map(|side| (side, blade_outcome(*prev.get(side), *next.get(side))))
        .collect();
    if !blades.is_empty() {
        let blade_at = if any_pair {
            pair_at + BLADE_SETTLE_MS
        } else {
            pair_at
        };
        for &(side, outcome) in &blades {
            plan.push(
                Phase::Reveal {
                    side,
                    slot: CardSlot::Blade,
                    outcome: Some(outcome),
                },
                blade_at,
            );
        }
        let resolved_at = blade_at + BLADE_SEQUENCE_MS;
        for &(side, outcome) in &blades {
            plan.push(Phase::BladeResolved { side, outcome }, resolved_at);
        }
        reveal_end = reveal_end.max(resolved_at);
    }

    let stats_at = reveal_end + STAT_SETTLE_MS;
    plan.push(Phase::UpdateStats { stats: next, prev }, stats_at);
    plan.push(Phase::Advance, stats_at + STAT_TWEEN_MS + STEP_HOLD_MS);
    plan
}
