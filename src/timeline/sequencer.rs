//! Step sequencer
//!
//! Walks the step list one cascade at a time. Each step becomes a plan of
//! phases scheduled on the cascade; `update` advances the timeline clock,
//! ticking engines up to each task's due time before running it, so results
//! do not depend on frame size or speed factor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cascade::{Cascade, Phase};
use super::plan::{plan_step, prev_states, view_states};
use crate::anim::StatsDisplay;
use crate::consts::*;
use crate::duel::{CardSlot, DuelStep, EnvCard, Hand, SideMapping, SideState, ViewPair, ViewSide};
use crate::engine::{CardHand, DeckEngine, EnvDeck, HandEngine, Outcome};
use crate::settings::PlaybackSettings;

/// Where playback stands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackCursor {
    /// Next step to animate (equals the step count once finished)
    pub step_index: usize,
    pub is_playing: bool,
    /// Timeline speed, always > 0
    pub speed_factor: f64,
    /// A step cascade is in flight
    pub is_animating_step: bool,
}

impl PlaybackCursor {
    pub fn new(settings: &PlaybackSettings) -> Self {
        Self {
            step_index: 0,
            is_playing: settings.auto_play,
            speed_factor: settings.speed_factor(),
            is_animating_step: false,
        }
    }
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self::new(&PlaybackSettings::default())
    }
}

/// Exactly-once guards for one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LatchSet {
    pub hand_spawned: bool,
    /// Indexed by `CardSlot::index`
    pub revealed: [bool; 4],
}

impl LatchSet {
    pub fn is_revealed(&self, slot: CardSlot) -> bool {
        self.revealed[slot.index()]
    }

    /// At least one card of this side is face-up
    pub fn any_revealed(&self) -> bool {
        self.revealed.iter().any(|&r| r)
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

/// Observable things the timeline did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimelineEvent {
    HandSpawned(ViewSide),
    CardRevealed(ViewSide, CardSlot),
    EnvironmentDrawn(EnvCard),
    BladeResolved { side: ViewSide, outcome: Outcome },
    StatsUpdated { step: usize },
    /// Health went down this step
    DamageTaken(ViewSide),
    /// Step `n` finished
    StepAdvanced(usize),
    DuelFinished { winner: Option<ViewSide> },
    Reset,
}

/// Side left standing, if exactly one
pub fn winner_of(states: &ViewPair<SideState>) -> Option<ViewSide> {
    match (states.left.is_dead(), states.right.is_dead()) {
        (false, true) => Some(ViewSide::Left),
        (true, false) => Some(ViewSide::Right),
        _ => None,
    }
}

/// Drives hands and deck through the step list
#[derive(Debug)]
pub struct StepSequencer<H = CardHand, D = EnvDeck> {
    hands: ViewPair<H>,
    deck: D,
    cascade: Cascade,
    latches: ViewPair<LatchSet>,
    steps: Option<Arc<[DuelStep]>>,
    mapping: SideMapping,
    duel_hands: ViewPair<Hand>,
    stats: ViewPair<StatsDisplay>,
    events: Vec<TimelineEvent>,
    finished: bool,
    winner: Option<ViewSide>,
}

impl StepSequencer<CardHand, EnvDeck> {
    /// Default engines configured from settings
    pub fn with_settings(settings: &PlaybackSettings) -> Self {
        let reduced_motion = settings.reduced_motion;
        Self::new(
            ViewPair::new(
                CardHand::new(ViewSide::Left).with_reduced_motion(reduced_motion),
                CardHand::new(ViewSide::Right).with_reduced_motion(reduced_motion),
            ),
            EnvDeck::new().with_reduced_motion(reduced_motion),
        )
    }
}

impl<H: HandEngine, D: DeckEngine> StepSequencer<H, D> {
    pub fn new(hands: ViewPair<H>, deck: D) -> Self {
        Self {
            hands,
            deck,
            cascade: Cascade::new(),
            latches: ViewPair::default(),
            steps: None,
            mapping: SideMapping::default(),
            duel_hands: ViewPair::default(),
            stats: ViewPair::default(),
            events: Vec::new(),
            finished: false,
            winner: None,
        }
    }

    /// Take a step list and stack its environment cards in draw order
    pub fn load(&mut self, steps: Arc<[DuelStep]>, mapping: SideMapping) {
        let cards: Vec<EnvCard> = steps.iter().filter_map(|s| s.environment_card).collect();
        self.deck.load(&cards);
        log::info!(
            "Loaded {} steps, {} environment cards",
            steps.len(),
            cards.len()
        );
        self.mapping = mapping;
        self.steps = Some(steps);
    }

    /// Reset and forget the current duel entirely
    pub fn unload(&mut self, cursor: &mut PlaybackCursor) {
        self.reset(cursor);
        self.steps = None;
        self.duel_hands = ViewPair::default();
        self.mapping = SideMapping::default();
        self.deck.load(&[]);
    }

    /// Hands to show, in viewer space. Already spawned hands take the new
    /// faces in place.
    pub fn set_hands(&mut self, hands: ViewPair<Hand>) {
        for side in ViewSide::BOTH {
            let next = hands.get(side);
            if self.latches.get(side).hand_spawned && next != self.duel_hands.get(side) {
                self.hands.get_mut(side).set_faces(next);
            }
        }
        self.duel_hands = hands;
    }

    pub fn is_loaded(&self) -> bool {
        self.steps.is_some()
    }

    pub fn step_count(&self) -> usize {
        self.steps.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn winner(&self) -> Option<ViewSide> {
        self.winner
    }

    pub fn latches(&self, side: ViewSide) -> &LatchSet {
        self.latches.get(side)
    }

    pub fn stats(&self) -> &ViewPair<StatsDisplay> {
        &self.stats
    }

    pub fn hand(&self, side: ViewSide) -> &H {
        self.hands.get(side)
    }

    pub fn hand_mut(&mut self, side: ViewSide) -> &mut H {
        self.hands.get_mut(side)
    }

    pub fn deck(&self) -> &D {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut D {
        &mut self.deck
    }

    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Spawn a hand once per playthrough
    pub fn spawn_hand(&mut self, side: ViewSide) -> bool {
        let latch = self.latches.get_mut(side);
        if latch.hand_spawned {
            log::debug!("{:?} hand already spawned", side);
            return false;
        }
        latch.hand_spawned = true;
        self.hands.get_mut(side).spawn(self.duel_hands.get(side));
        self.events.push(TimelineEvent::HandSpawned(side));
        true
    }

    /// Reveal a card once per playthrough, spawning its hand first if needed
    pub fn reveal_card(&mut self, side: ViewSide, slot: CardSlot, outcome: Option<Outcome>) -> bool {
        if self.latches.get(side).is_revealed(slot) {
            log::debug!("{:?} {} already revealed", side, slot);
            return false;
        }
        self.spawn_hand(side);
        self.latches.get_mut(side).revealed[slot.index()] = true;
        self.hands.get_mut(side).reveal(slot, outcome);
        self.events.push(TimelineEvent::CardRevealed(side, slot));
        true
    }

    /// Schedule the cascade for the step under the cursor
    pub fn begin_step(&mut self, cursor: &mut PlaybackCursor) -> bool {
        if cursor.is_animating_step {
            log::debug!("Step {} still animating", cursor.step_index);
            return false;
        }
        let Some(steps) = self.steps.clone() else {
            return false;
        };
        let index = cursor.step_index;
        let Some(step) = steps.get(index) else {
            return false;
        };

        cursor.is_animating_step = true;
        let prev = prev_states(&steps, index, self.mapping);
        let plan = plan_step(index, step, prev, self.mapping);
        let wall_ms = plan
            .phases
            .iter()
            .map(|d| d.wall_delay_ms(cursor.speed_factor))
            .fold(0.0, f64::max);
        log::debug!(
            "Step {} begins: {} phases over {:.0}ms ({:.0}ms at {}x)",
            index,
            plan.phases.len(),
            plan.duration_ms(),
            wall_ms,
            cursor.speed_factor
        );
        self.cascade.schedule_plan(plan);
        true
    }

    /// Pause and play exactly one step
    pub fn step_forward(&mut self, cursor: &mut PlaybackCursor) -> bool {
        cursor.is_playing = false;
        self.begin_step(cursor)
    }

    /// Play/pause. A finished duel starts over from the first step.
    pub fn toggle_play(&mut self, cursor: &mut PlaybackCursor) {
        if self.finished {
            self.reset(cursor);
            cursor.is_playing = true;
            self.begin_step(cursor);
            return;
        }
        cursor.is_playing = !cursor.is_playing;
        if cursor.is_playing && !cursor.is_animating_step {
            self.begin_step(cursor);
        }
    }

    /// Change speed; ignores non-positive or non-finite values
    pub fn set_speed(&mut self, cursor: &mut PlaybackCursor, speed_factor: f64) -> bool {
        if !(speed_factor.is_finite() && speed_factor > 0.0) {
            log::warn!("Ignoring speed factor {}", speed_factor);
            return false;
        }
        cursor.speed_factor = speed_factor;
        true
    }

    /// Advance by wall-clock milliseconds
    pub fn update(&mut self, cursor: &mut PlaybackCursor, wall_dt_ms: f64) {
        if self.is_loaded() && self.step_count() == 0 && !self.finished {
            log::warn!("Empty step log, showing the final state");
            self.show_terminal(cursor);
        }
        if cursor.is_playing && !cursor.is_animating_step && !self.finished {
            self.begin_step(cursor);
        }

        let until = self.cascade.now() + wall_dt_ms.max(0.0) * cursor.speed_factor;
        let mut clock = self.cascade.now();
        while let Some(task) = self.cascade.pop_due(until) {
            self.tick_engines(task.due - clock);
            clock = task.due;
            if !self.cascade.is_current(&task) {
                log::debug!("Dropping stale {} task", task.phase.name());
                continue;
            }
            self.execute(cursor, task.phase);
        }
        self.cascade.advance_to(until);
        self.tick_engines(until - clock);
    }

    /// Cancel everything and return to the pre-spawn state
    pub fn reset(&mut self, cursor: &mut PlaybackCursor) {
        let dropped = self.cascade.cancel_all();
        cursor.step_index = 0;
        cursor.is_animating_step = false;
        self.latches = ViewPair::default();
        for (_, hand) in self.hands.iter_mut() {
            hand.reset();
        }
        self.deck.reset();
        self.stats = ViewPair::default();
        self.finished = false;
        self.winner = None;
        self.events.push(TimelineEvent::Reset);
        log::info!("Timeline reset ({} pending phases cancelled)", dropped);
    }

    /// Skip straight to the end: spawn what exists, no reveals, final stats
    pub fn show_terminal(&mut self, cursor: &mut PlaybackCursor) {
        self.cascade.cancel_all();
        cursor.is_animating_step = false;
        cursor.is_playing = false;

        for side in ViewSide::BOTH {
            if !self.duel_hands.get(side).is_empty() {
                self.spawn_hand(side);
            }
        }

        let last = match self.steps.as_ref().and_then(|s| s.last()) {
            Some(step) => view_states(step, self.mapping),
            None => ViewPair::new(SideState::INITIAL, SideState::INITIAL),
        };
        for (side, stats) in self.stats.iter_mut() {
            stats.snap(*last.get(side));
        }

        let winner = match (self.duel_hands.left.is_empty(), self.duel_hands.right.is_empty()) {
            (false, true) => Some(ViewSide::Left),
            (true, false) => Some(ViewSide::Right),
            _ => winner_of(&last),
        };
        cursor.step_index = self.step_count();
        self.finish(winner, &last);
    }

    fn finish(&mut self, winner: Option<ViewSide>, last: &ViewPair<SideState>) {
        self.finished = true;
        self.winner = winner;
        for (side, hand) in self.hands.iter_mut() {
            let outcome = match winner {
                Some(w) if w == side => Some(Outcome::Victory),
                Some(_) => Some(Outcome::Defeat),
                None if last.get(side).is_dead() => Some(Outcome::Defeat),
                None => None,
            };
            if let Some(outcome) = outcome {
                hand.mark_outcome(outcome);
            }
        }
        log::info!("Duel finished, winner: {:?}", winner);
        self.events.push(TimelineEvent::DuelFinished { winner });
    }

    fn tick_engines(&mut self, dt_ms: f64) {
        if dt_ms <= 0.0 {
            return;
        }
        for (_, hand) in self.hands.iter_mut() {
            hand.update(dt_ms);
        }
        self.deck.update(dt_ms);
        for (_, stats) in self.stats.iter_mut() {
            stats.update(dt_ms);
        }
    }

    fn execute(&mut self, cursor: &mut PlaybackCursor, phase: Phase) {
        log::debug!("Step {}: {}", cursor.step_index, phase.name());
        match phase {
            Phase::SpawnHands => {
                for side in ViewSide::BOTH {
                    self.spawn_hand(side);
                }
            }
            Phase::DrawEnvironment(expected) => match self.deck.draw() {
                Some(card) => {
                    if card != expected {
                        log::warn!("Drew {} but step expects {}", card.as_str(), expected.as_str());
                    }
                    self.events.push(TimelineEvent::EnvironmentDrawn(card));
                }
                None => log::warn!("No environment card left for {}", expected.as_str()),
            },
            Phase::Reveal {
                side,
                slot,
                outcome,
            } => {
                self.reveal_card(side, slot, outcome);
            }
            Phase::BladeResolved { side, outcome } => {
                self.events.push(TimelineEvent::BladeResolved { side, outcome });
            }
            Phase::UpdateStats { stats, prev } => {
                for side in ViewSide::BOTH {
                    let next = *stats.get(side);
                    self.stats.get_mut(side).set_target(next, STAT_TWEEN_MS);
                    if next.health < prev.get(side).health {
                        self.events.push(TimelineEvent::DamageTaken(side));
                    }
                }
                self.events.push(TimelineEvent::StatsUpdated {
                    step: cursor.step_index,
                });
            }
            Phase::Advance => {
                let done = cursor.step_index;
                cursor.step_index += 1;
                cursor.is_animating_step = false;
                self.events.push(TimelineEvent::StepAdvanced(done));

                if cursor.step_index >= self.step_count() {
                    cursor.is_playing = false;
                    let last = match self.steps.as_ref().and_then(|s| s.last()) {
                        Some(step) => view_states(step, self.mapping),
                        None => ViewPair::new(SideState::INITIAL, SideState::INITIAL),
                    };
                    self.finish(winner_of(&last), &last);
                } else if cursor.is_playing {
                    self.begin_step(cursor);
                }
            }
        }
    }
}
