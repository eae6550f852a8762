//! Timeline controller
//!
//! Owns duel identity, the side mapping and the playback cursor. Each update
//! polls the duel source, feeds the sequencer once steps are available and
//! keeps the derived status (stages, withdrawal, call-to-action) current.

use serde::{Deserialize, Serialize};

use super::sequencer::{PlaybackCursor, StepSequencer, TimelineEvent};
use crate::anim::StatsDisplay;
use crate::duel::{
    CardSlot, CompletedStages, DuelHands, DuelId, DuelSource, DuelStage, DuelistId, SideMapping,
    ViewPair, ViewSide,
};
use crate::engine::{CardHand, DeckEngine, EnvDeck, HandEngine, InspectRequest};
use crate::settings::PlaybackSettings;

/// Everything tied to one duel identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelSession {
    pub duel_id: DuelId,
    /// Derived once, the first time both duelists are known
    pub mapping: Option<SideMapping>,
    /// The viewer's duelist, if the viewer takes part
    pub viewer: Option<DuelistId>,
    pub steps_loaded: bool,
    /// Last hands seen from the source (A/B)
    pub hands: DuelHands,
    pub has_withdrawn_or_abandoned: bool,
    /// High-water marks per viewer side
    pub completed: ViewPair<CompletedStages>,
    pub cta_cleared: bool,
}

impl DuelSession {
    pub fn new(duel_id: DuelId) -> Self {
        Self {
            duel_id,
            mapping: None,
            viewer: None,
            steps_loaded: false,
            hands: DuelHands::default(),
            has_withdrawn_or_abandoned: false,
            completed: ViewPair::default(),
            cta_cleared: false,
        }
    }
}

/// Entry point for the UI
pub struct TimelineController<S, H = CardHand, D = EnvDeck> {
    source: S,
    settings: PlaybackSettings,
    cursor: PlaybackCursor,
    sequencer: StepSequencer<H, D>,
    session: Option<DuelSession>,
    /// Details/inspection requests waiting for an engine to be ready
    pending_hand: ViewPair<Option<InspectRequest>>,
    pending_deck: Option<InspectRequest>,
}

impl<S: DuelSource> TimelineController<S> {
    /// Controller with the default card engines
    pub fn new(source: S, settings: PlaybackSettings) -> Self {
        let sequencer = StepSequencer::with_settings(&settings);
        Self::with_sequencer(source, settings, sequencer)
    }
}

impl<S: DuelSource, H: HandEngine, D: DeckEngine> TimelineController<S, H, D> {
    pub fn with_sequencer(source: S, settings: PlaybackSettings, sequencer: StepSequencer<H, D>) -> Self {
        Self {
            source,
            cursor: PlaybackCursor::new(&settings),
            settings,
            sequencer,
            session: None,
            pending_hand: ViewPair::default(),
            pending_deck: None,
        }
    }

    /// Switch duels. Returns false (and does nothing) for the current duel.
    pub fn set_duel(&mut self, duel_id: DuelId) -> bool {
        if self.session.as_ref().is_some_and(|s| s.duel_id == duel_id) {
            return false;
        }
        self.sequencer.unload(&mut self.cursor);
        self.cursor = PlaybackCursor::new(&self.settings);
        self.session = Some(DuelSession::new(duel_id));
        self.pending_hand = ViewPair::default();
        self.pending_deck = None;
        log::info!("Duel {} selected", duel_id);
        self.poll();
        true
    }

    /// Start the current duel over (the final state again after a withdrawal)
    pub fn reset_duel(&mut self) {
        self.sequencer.reset(&mut self.cursor);
        if self.has_withdrawn_or_abandoned() {
            self.sequencer.show_terminal(&mut self.cursor);
        }
    }

    /// Pause and animate one step
    pub fn step_forward(&mut self) -> bool {
        if self.has_withdrawn_or_abandoned() {
            return false;
        }
        self.sequencer.step_forward(&mut self.cursor)
    }

    pub fn toggle_play(&mut self) {
        if self.has_withdrawn_or_abandoned() {
            return;
        }
        self.sequencer.toggle_play(&mut self.cursor);
    }

    pub fn set_speed_factor(&mut self, speed_factor: f64) -> bool {
        self.sequencer.set_speed(&mut self.cursor, speed_factor)
    }

    /// Advance by wall-clock milliseconds
    pub fn update(&mut self, wall_dt_ms: f64) {
        self.poll();
        self.sequencer.update(&mut self.cursor, wall_dt_ms);
        self.apply_pending_inspection();
        self.refresh_progress();
    }

    fn poll(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let id = session.duel_id;

        if session.mapping.is_none() {
            if let Some((a, b)) = self.source.duelists(id) {
                let a_mine = self.source.is_mine(&a.address);
                let b_mine = self.source.is_mine(&b.address);
                let mapping = SideMapping::derive(a_mine, b_mine);
                session.viewer = if a_mine {
                    Some(a.id)
                } else if b_mine {
                    Some(b.id)
                } else {
                    None
                };
                session.mapping = Some(mapping);
                log::info!("Duel {}: viewer is B = {}", id, mapping.viewer_is_b);
            }
        }
        let Some(mapping) = session.mapping else {
            return;
        };

        let hands = self.source.hands(id);
        if hands != session.hands {
            self.sequencer
                .set_hands(ViewPair::from_data(mapping, hands.a.clone(), hands.b.clone()));
            session.hands = hands;
        }

        if !session.steps_loaded && !session.has_withdrawn_or_abandoned {
            if let Some(steps) = self.source.duel_steps(id) {
                self.sequencer.load(steps, mapping);
                session.steps_loaded = true;
                if self.settings.shuffle_between_duels {
                    self.sequencer.deck_mut().shuffle(id.0);
                }
            }
        }

        let incomplete = session.hands.a.is_empty() || session.hands.b.is_empty();
        if !session.has_withdrawn_or_abandoned && incomplete && self.source.is_finished(id) {
            session.has_withdrawn_or_abandoned = true;
            log::info!("Duel {} withdrawn or abandoned, showing final state", id);
            self.sequencer.show_terminal(&mut self.cursor);
        }
    }

    fn apply_pending_inspection(&mut self) {
        for side in ViewSide::BOTH {
            let Some(request) = *self.pending_hand.get(side) else {
                continue;
            };
            let hand = self.sequencer.hand_mut(side);
            let applied = match request {
                InspectRequest::Expand if hand.is_ready_to_show() => {
                    hand.show_details();
                    true
                }
                InspectRequest::Collapse if hand.is_ready_to_collapse() => {
                    hand.hide_details();
                    true
                }
                _ => false,
            };
            if applied {
                *self.pending_hand.get_mut(side) = None;
            }
        }

        if let Some(request) = self.pending_deck {
            let deck = self.sequencer.deck_mut();
            let applied = match request {
                InspectRequest::Expand if deck.is_ready_to_show() => {
                    deck.expand();
                    true
                }
                InspectRequest::Collapse if deck.is_ready_to_collapse() => {
                    deck.collapse();
                    true
                }
                _ => false,
            };
            if applied {
                self.pending_deck = None;
            }
        }
    }

    fn refresh_progress(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(mapping) = session.mapping else {
            return;
        };
        let finished = self.sequencer.is_finished();

        let hands = ViewPair::from_data(mapping, &session.hands.a, &session.hands.b);
        for side in ViewSide::BOTH {
            let reached = CompletedStages {
                committed: !hands.get(side).is_empty(),
                revealed: self.sequencer.latches(side).any_revealed(),
                resolved: finished,
            };
            session.completed.get_mut(side).merge(reached);
        }

        if finished && !session.cta_cleared {
            session.cta_cleared = true;
            if let Some(viewer) = session.viewer {
                if self.source.call_to_action(session.duel_id) {
                    self.source.clear_call_to_action(viewer);
                    log::info!("Cleared call to action for duel {}", session.duel_id);
                }
            }
        }
    }

    /// Open (true) or close the details grid for a hand once it is ready
    pub fn inspect_hand(&mut self, side: ViewSide, open: bool) {
        let request = if open {
            InspectRequest::Expand
        } else {
            InspectRequest::Collapse
        };
        *self.pending_hand.get_mut(side) = Some(request);
        self.apply_pending_inspection();
    }

    /// Open (true) or close the deck inspection row once it is ready
    pub fn inspect_deck(&mut self, open: bool) {
        self.pending_deck = Some(if open {
            InspectRequest::Expand
        } else {
            InspectRequest::Collapse
        });
        self.apply_pending_inspection();
    }

    /// Hover fan-out (cosmetic, deferred by the engine while animating)
    pub fn hover_hand(&mut self, side: ViewSide, hovering: bool) {
        let hand = self.sequencer.hand_mut(side);
        if hovering {
            hand.expand();
        } else {
            hand.collapse();
        }
    }

    pub fn select_hand_card(&mut self, side: ViewSide, slot: CardSlot) {
        self.sequencer.hand_mut(side).select(slot);
    }

    pub fn select_deck_card(&mut self, index: usize) {
        self.sequencer.deck_mut().select(index);
    }

    /// Put every active card back in its slot
    pub fn return_active_cards(&mut self) {
        for side in ViewSide::BOTH {
            self.sequencer.hand_mut(side).return_active_card();
        }
        self.sequencer.deck_mut().return_active_card();
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn duel_id(&self) -> Option<DuelId> {
        self.session.as_ref().map(|s| s.duel_id)
    }

    pub fn session(&self) -> Option<&DuelSession> {
        self.session.as_ref()
    }

    pub fn side_mapping(&self) -> Option<SideMapping> {
        self.session.as_ref().and_then(|s| s.mapping)
    }

    pub fn has_withdrawn_or_abandoned(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.has_withdrawn_or_abandoned)
    }

    pub fn completed_stages(&self, side: ViewSide) -> CompletedStages {
        self.session
            .as_ref()
            .map(|s| *s.completed.get(side))
            .unwrap_or_default()
    }

    pub fn duel_stage(&self) -> DuelStage {
        let Some(session) = self.session.as_ref() else {
            return DuelStage::Loading;
        };
        let step = self.cursor.step_index;
        if session.has_withdrawn_or_abandoned {
            DuelStage::Withdrawn
        } else if !session.steps_loaded {
            DuelStage::Loading
        } else if self.sequencer.is_finished() {
            DuelStage::Finished
        } else if self.cursor.is_animating_step || self.cursor.is_playing {
            DuelStage::Animating { step }
        } else if step == 0 {
            DuelStage::Ready
        } else {
            DuelStage::Paused { step }
        }
    }

    pub fn winner(&self) -> Option<ViewSide> {
        self.sequencer.winner()
    }

    pub fn stats(&self) -> &ViewPair<StatsDisplay> {
        self.sequencer.stats()
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        self.sequencer.drain_events()
    }

    pub fn sequencer(&self) -> &StepSequencer<H, D> {
        &self.sequencer
    }

    pub fn hand(&self, side: ViewSide) -> &H {
        self.sequencer.hand(side)
    }

    pub fn deck(&self) -> &D {
        self.sequencer.deck()
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duel::{
        Address, BladeCard, DuelRecord, DuelStep, Duelist, EnvCard, Hand, MemorySource, SideState,
        SideStep, TacticsCard,
    };
    use crate::engine::Outcome;
    use crate::timeline::doubles::{HandCall, RecordingHand};

    type TestController = TimelineController<MemorySource, RecordingHand, EnvDeck>;

    const ALICE: &str = "0xa11ce";
    const BOB: &str = "0xb0b";

    fn side(cards: &[CardSlot], health: u8) -> SideStep {
        SideStep {
            cards_played: cards.to_vec(),
            state: SideState {
                health,
                ..SideState::INITIAL
            },
        }
    }

    fn steps() -> Vec<DuelStep> {
        vec![
            DuelStep {
                environment_card: Some(EnvCard::DamageUp),
                side_a: side(&[CardSlot::Tactics], 3),
                side_b: side(&[CardSlot::Tactics], 3),
            },
            DuelStep {
                environment_card: Some(EnvCard::ChancesDown),
                side_a: side(&[CardSlot::Fire], 3),
                side_b: side(&[CardSlot::Dodge], 2),
            },
            DuelStep {
                environment_card: None,
                side_a: side(&[CardSlot::Blade], 2),
                side_b: side(&[], 0),
            },
        ]
    }

    fn hand() -> Hand {
        Hand {
            tactics: Some(TacticsCard::Bananas),
            fire: Some(3),
            dodge: Some(8),
            blade: Some(BladeCard::Seppuku),
        }
    }

    fn record(id: u64, b_hand: Hand, with_steps: bool) -> DuelRecord {
        DuelRecord {
            duel_id: DuelId(id),
            duelist_a: Duelist {
                id: DuelistId(1),
                address: Address::new(ALICE),
            },
            duelist_b: Duelist {
                id: DuelistId(2),
                address: Address::new(BOB),
            },
            hands: DuelHands { a: hand(), b: b_hand },
            finished: true,
            call_to_action: true,
            steps: with_steps.then(steps),
        }
    }

    fn controller(source: MemorySource) -> TestController {
        let settings = PlaybackSettings::default();
        let sequencer = StepSequencer::new(ViewPair::default(), EnvDeck::new());
        TimelineController::with_sequencer(source, settings, sequencer)
    }

    fn run(ctl: &mut TestController, frames: usize) -> Vec<TimelineEvent> {
        let mut events = Vec::new();
        for _ in 0..frames {
            ctl.update(16.0);
            events.extend(ctl.drain_events());
        }
        events
    }

    #[test]
    fn test_set_duel_is_idempotent() {
        let mut source = MemorySource::new();
        source.insert(record(7, hand(), true));
        let mut ctl = controller(source);

        assert!(ctl.set_duel(DuelId(7)));
        run(&mut ctl, 100);
        let cursor = *ctl.cursor();
        assert!(cursor.is_animating_step);

        assert!(!ctl.set_duel(DuelId(7)));
        assert_eq!(*ctl.cursor(), cursor);
        assert!(ctl.sequencer().latches(ViewSide::Left).hand_spawned);
    }

    #[test]
    fn test_duel_change_resets_everything() {
        let mut source = MemorySource::new();
        source.insert(record(7, hand(), true));
        source.insert(record(8, hand(), false));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        ctl.set_speed_factor(2.0);
        run(&mut ctl, 300);
        assert!(ctl.cursor().step_index > 0);

        assert!(ctl.set_duel(DuelId(8)));
        let cursor = ctl.cursor();
        assert_eq!(cursor.step_index, 0);
        assert!(cursor.is_playing);
        assert_eq!(cursor.speed_factor, 1.0);
        assert!(!cursor.is_animating_step);
        assert!(ctl.sequencer().cascade().is_idle());
        assert!(ctl.sequencer().latches(ViewSide::Left).is_clear());
        assert_eq!(ctl.duel_stage(), DuelStage::Loading);
        assert_eq!(ctl.completed_stages(ViewSide::Left), CompletedStages::default());
    }

    #[test]
    fn test_side_mapping_is_stable() {
        let mut source = MemorySource::new().with_viewer(Address::new(BOB));
        source.insert(record(7, hand(), true));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        assert_eq!(ctl.side_mapping(), Some(SideMapping { viewer_is_b: true }));
        assert_eq!(ctl.session().and_then(|s| s.viewer), Some(DuelistId(2)));

        // Another identity resolving later does not flip the board
        ctl.source_mut().add_viewer(Address::new(ALICE));
        run(&mut ctl, 50);
        assert_eq!(ctl.side_mapping(), Some(SideMapping { viewer_is_b: true }));
    }

    #[test]
    fn test_steps_arriving_late_start_playback() {
        let mut source = MemorySource::new();
        source.insert(record(7, hand(), false));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        run(&mut ctl, 20);
        assert_eq!(ctl.duel_stage(), DuelStage::Loading);
        assert!(!ctl.cursor().is_animating_step);

        ctl.source_mut().publish_steps(DuelId(7), steps());
        ctl.update(16.0);
        assert_eq!(ctl.duel_stage(), DuelStage::Animating { step: 0 });
    }

    #[test]
    fn test_spawn_alone_is_not_revealed() {
        let mut source = MemorySource::new();
        source.insert(record(7, hand(), true));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        ctl.update(16.0);

        assert!(ctl.sequencer().latches(ViewSide::Left).hand_spawned);
        let stages = ctl.completed_stages(ViewSide::Left);
        assert!(stages.committed);
        assert!(!stages.revealed);

        run(&mut ctl, 200);
        assert!(ctl.completed_stages(ViewSide::Left).revealed);
    }

    #[test]
    fn test_hands_arriving_after_spawn_get_faces() {
        let mut late = record(7, Hand::default(), true);
        late.hands.a = Hand::default();
        late.finished = false;
        let mut source = MemorySource::new();
        source.insert(late);
        let mut ctl = TimelineController::new(source, PlaybackSettings::default());
        ctl.set_duel(DuelId(7));
        for _ in 0..30 {
            ctl.update(16.0);
        }
        assert!(ctl.sequencer().latches(ViewSide::Left).hand_spawned);
        assert_eq!(ctl.hand(ViewSide::Left).unit(CardSlot::Tactics).face, None);

        ctl.source_mut()
            .publish_hands(DuelId(7), DuelHands { a: hand(), b: hand() });
        for _ in 0..1000 {
            ctl.update(16.0);
        }
        assert_eq!(ctl.duel_stage(), DuelStage::Finished);
        for side in ViewSide::BOTH {
            let h = ctl.hand(side);
            assert!(h.is_revealed(CardSlot::Tactics));
            assert_eq!(h.unit(CardSlot::Tactics).face, hand().face(CardSlot::Tactics));
        }
    }

    #[test]
    fn test_empty_step_log_finishes() {
        let mut source = MemorySource::new().with_viewer(Address::new(ALICE));
        source.insert(record(7, hand(), false));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        ctl.source_mut().publish_steps(DuelId(7), Vec::new());
        run(&mut ctl, 5);

        assert_eq!(ctl.duel_stage(), DuelStage::Finished);
        assert_eq!(ctl.winner(), None);
        assert!(!ctl.source().call_to_action(DuelId(7)));
    }

    #[test]
    fn test_full_playthrough() {
        let mut source = MemorySource::new().with_viewer(Address::new(ALICE));
        source.insert(record(7, hand(), true));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        let events = run(&mut ctl, 1000);

        assert_eq!(ctl.duel_stage(), DuelStage::Finished);
        assert_eq!(ctl.winner(), Some(ViewSide::Left));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, TimelineEvent::StepAdvanced(_)))
                .count(),
            3
        );
        for side in ViewSide::BOTH {
            assert_eq!(
                ctl.completed_stages(side),
                CompletedStages {
                    committed: true,
                    revealed: true,
                    resolved: true,
                }
            );
        }
        assert_eq!(ctl.stats().right.shown().health, 0);
        assert!(!ctl.source().call_to_action(DuelId(7)));
        assert_eq!(ctl.source().cleared, vec![DuelistId(1)]);

        // Reset keeps the high-water marks; playback stopped at the end
        ctl.reset_duel();
        assert!(ctl.completed_stages(ViewSide::Left).resolved);
        assert_eq!(ctl.duel_stage(), DuelStage::Ready);

        ctl.toggle_play();
        assert_eq!(ctl.duel_stage(), DuelStage::Animating { step: 0 });
    }

    #[test]
    fn test_spectator_never_clears_call_to_action() {
        let mut source = MemorySource::new();
        source.insert(record(7, hand(), true));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        run(&mut ctl, 1000);
        assert_eq!(ctl.duel_stage(), DuelStage::Finished);
        assert!(ctl.source().cleared.is_empty());
    }

    #[test]
    fn test_withdrawal_shows_terminal_state() {
        let mut source = MemorySource::new();
        source.insert(record(7, Hand::default(), true));
        let mut ctl = controller(source);
        ctl.set_duel(DuelId(7));
        assert!(ctl.has_withdrawn_or_abandoned());
        assert_eq!(ctl.duel_stage(), DuelStage::Withdrawn);

        run(&mut ctl, 500);
        ctl.toggle_play();
        assert!(!ctl.step_forward());
        run(&mut ctl, 500);

        // B sits right for a spectator
        let right = ctl.hand(ViewSide::Right);
        assert!(right.reveals().is_empty());
        assert_eq!(right.spawns(), 0);
        assert!(ctl.hand(ViewSide::Left).reveals().is_empty());
        assert_eq!(
            ctl.hand(ViewSide::Left).calls.last(),
            Some(&HandCall::MarkOutcome(Outcome::Victory))
        );
        assert_eq!(ctl.winner(), Some(ViewSide::Left));

        ctl.reset_duel();
        assert_eq!(ctl.duel_stage(), DuelStage::Withdrawn);
        assert!(ctl.hand(ViewSide::Right).reveals().is_empty());
    }

    #[test]
    fn test_details_wait_for_ready_hand() {
        let mut source = MemorySource::new();
        source.insert(record(7, hand(), true));
        let settings = PlaybackSettings {
            auto_play: false,
            ..Default::default()
        };
        let sequencer = StepSequencer::new(ViewPair::default(), EnvDeck::new());
        let mut ctl: TestController = TimelineController::with_sequencer(source, settings, sequencer);
        ctl.set_duel(DuelId(7));
        assert_eq!(ctl.duel_stage(), DuelStage::Ready);

        assert!(ctl.step_forward());
        ctl.update(16.0);
        // Still spawning: nothing happens yet
        ctl.inspect_hand(ViewSide::Left, true);
        assert!(!ctl.hand(ViewSide::Left).calls.contains(&HandCall::ShowDetails));

        run(&mut ctl, 400);
        let shows = ctl
            .hand(ViewSide::Left)
            .calls
            .iter()
            .filter(|c| **c == HandCall::ShowDetails)
            .count();
        assert_eq!(shows, 1);
        assert_eq!(ctl.duel_stage(), DuelStage::Paused { step: 1 });

        // Idle between steps: applies at once
        ctl.inspect_hand(ViewSide::Left, true);
        assert_eq!(ctl.hand(ViewSide::Left).calls.last(), Some(&HandCall::ShowDetails));
        ctl.inspect_hand(ViewSide::Left, false);
        assert_eq!(ctl.hand(ViewSide::Left).calls.last(), Some(&HandCall::ShowDetails));
        run(&mut ctl, 50);
        assert_eq!(ctl.hand(ViewSide::Left).calls.last(), Some(&HandCall::HideDetails));
    }

    #[test]
    fn test_deck_inspection_after_draws() {
        let mut source = MemorySource::new();
        source.insert(record(7, hand(), true));
        let mut ctl = TimelineController::new(source, PlaybackSettings::default());
        ctl.set_duel(DuelId(7));
        ctl.inspect_deck(true);
        for _ in 0..1000 {
            ctl.update(16.0);
        }
        assert_eq!(ctl.deck().drawn_cards().len(), 2);
        assert_eq!(ctl.deck().mode(), crate::engine::DeckMode::Expanded);

        ctl.select_deck_card(1);
        assert_eq!(ctl.deck().active_card(), Some(1));
        ctl.return_active_cards();
        assert_eq!(ctl.deck().active_card(), None);
    }
}
