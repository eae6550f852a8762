//! Hand engine: four card units per side presented as one unit
//!
//! The engine is imperative and keeps no game logic. Exactly-once spawn and
//! reveal are the sequencer's job (latches); this side only animates.

use glam::Vec3;

use super::Outcome;
use super::inspect::{InspectRequest, Selection, SelectionChange};
use crate::anim::{CardUnit, Easing, Highlight, Keyframe, Pose, Transform, Tween};
use crate::consts::*;
use crate::duel::{CardSlot, Hand, ViewSide};

/// Operations the sequencer and UI may issue against one side's hand
pub trait HandEngine {
    /// Assign faces, fade in and fan out to the resting layout
    fn spawn(&mut self, hand: &Hand);
    /// Replace card faces in place (hands that arrive after the spawn)
    fn set_faces(&mut self, hand: &Hand);
    /// Flip a card face-up and move it to the result row. Blade runs the
    /// approach, clash and outcome sequence and needs `outcome`.
    fn reveal(&mut self, slot: CardSlot, outcome: Option<Outcome>);
    /// Mark the duel result on every known card
    fn mark_outcome(&mut self, outcome: Outcome);
    /// Hover inspection (deferred while animating)
    fn expand(&mut self);
    fn collapse(&mut self);
    /// Inspection grid
    fn show_details(&mut self);
    fn hide_details(&mut self);
    /// Toggle a revealed card as the active one (details mode only)
    fn select(&mut self, slot: CardSlot);
    fn return_active_card(&mut self);
    fn is_animating(&self) -> bool;
    fn is_ready_to_show(&self) -> bool;
    fn is_ready_to_collapse(&self) -> bool;
    /// Back to the pre-spawn resting pose, dropping all animation
    fn reset(&mut self);
    /// Advance by timeline milliseconds
    fn update(&mut self, dt_ms: f64);
}

/// Layout mode of a hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandMode {
    /// Not spawned
    Hidden,
    Resting,
    Expanded,
    Details,
}

/// Offset of a slot from the middle of the hand (-1.5..=1.5)
#[inline]
fn spread(slot: CardSlot) -> f32 {
    slot.index() as f32 - 1.5
}

fn offscreen(side: ViewSide, slot: CardSlot) -> Transform {
    Transform::at(Vec3::new(
        side.sign() * HAND_OFFSET_X + spread(slot) * HAND_SPACING,
        OFFSCREEN_Y,
        0.0,
    ))
}

fn fan(side: ViewSide, slot: CardSlot, spacing: f32) -> Transform {
    let s = spread(slot);
    Transform::at(Vec3::new(
        side.sign() * HAND_OFFSET_X + s * spacing,
        HAND_REST_Y - s.abs() * 0.1,
        slot.index() as f32 * 0.01,
    ))
    .with_rotation_z(-s * HAND_FAN_ANGLE)
}

fn result_row(side: ViewSide, slot: CardSlot) -> Transform {
    Transform::at(Vec3::new(
        side.sign() * RESULT_OFFSET_X + spread(slot) * HAND_SPACING,
        RESULT_Y,
        0.1,
    ))
}

fn clash_point(side: ViewSide) -> Transform {
    Transform::at(Vec3::new(side.sign() * CLASH_OFFSET_X, RESULT_Y + 0.5, 0.5)).with_scale(1.3)
}

fn details_grid(side: ViewSide, slot: CardSlot) -> Transform {
    let col = (slot.index() % 2) as f32;
    let row = (slot.index() / 2) as f32;
    Transform::at(Vec3::new(
        side.sign() * DETAILS_OFFSET_X + (col - 0.5) * DETAILS_SPACING,
        DETAILS_Y + (0.5 - row) * DETAILS_SPACING * 1.4,
        1.0,
    ))
    .with_scale(DETAILS_SCALE)
}

fn active_spot(side: ViewSide) -> Transform {
    Transform::at(Vec3::new(side.sign() * DETAILS_OFFSET_X, DETAILS_Y, ACTIVE_Z))
        .with_scale(ACTIVE_SCALE)
}

/// Default hand engine over four card units
#[derive(Debug, Clone)]
pub struct CardHand {
    side: ViewSide,
    units: [CardUnit; 4],
    /// Visual face-up state (what may be selected), not a latch
    revealed: [bool; 4],
    mode: HandMode,
    pending: Option<InspectRequest>,
    selection: Selection<CardSlot>,
    /// Applied to the blade card once its sequence drains
    blade_highlight: Option<Highlight>,
    outcome: Option<Outcome>,
    next_order: i32,
    reduced_motion: bool,
}

impl CardHand {
    pub fn new(side: ViewSide) -> Self {
        let base_id = match side {
            ViewSide::Left => 0,
            ViewSide::Right => 4,
        };
        let units = CardSlot::ALL.map(|slot| {
            CardUnit::new(base_id + slot.index() as u32, offscreen(side, slot))
        });
        Self {
            side,
            units,
            revealed: [false; 4],
            mode: HandMode::Hidden,
            pending: None,
            selection: Selection::default(),
            blade_highlight: None,
            outcome: None,
            next_order: 0,
            reduced_motion: false,
        }
    }

    /// Keep the blade clash still
    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    pub fn side(&self) -> ViewSide {
        self.side
    }

    pub fn mode(&self) -> HandMode {
        self.mode
    }

    pub fn units(&self) -> &[CardUnit; 4] {
        &self.units
    }

    pub fn unit(&self, slot: CardSlot) -> &CardUnit {
        &self.units[slot.index()]
    }

    pub fn is_revealed(&self, slot: CardSlot) -> bool {
        self.revealed[slot.index()]
    }

    pub fn active_card(&self) -> Option<CardSlot> {
        self.selection.active()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Where a card sits outside details mode
    fn home(&self, slot: CardSlot) -> Transform {
        if self.revealed[slot.index()] {
            result_row(self.side, slot)
        } else if self.mode == HandMode::Expanded {
            fan(self.side, slot, HAND_EXPAND_SPACING)
        } else {
            fan(self.side, slot, HAND_SPACING)
        }
    }

    fn move_unit(&mut self, slot: CardSlot, to: Transform) {
        self.units[slot.index()].retarget(Tween::new(
            Keyframe::to(to),
            INSPECT_MS,
            Easing::EaseOutCubic,
        ));
    }

    fn raise(&mut self, slot: CardSlot) {
        self.next_order += 1;
        self.units[slot.index()].render_order = self.next_order;
    }

    fn apply(&mut self, request: InspectRequest) {
        let target = match (request, self.mode) {
            (InspectRequest::Expand, HandMode::Resting) => HandMode::Expanded,
            (InspectRequest::Collapse, HandMode::Expanded) => HandMode::Resting,
            _ => return,
        };
        self.mode = target;
        for slot in CardSlot::ALL {
            if !self.revealed[slot.index()] {
                let home = self.home(slot);
                self.move_unit(slot, home);
            }
        }
    }

    fn request(&mut self, request: InspectRequest) {
        if self.mode == HandMode::Hidden || self.mode == HandMode::Details {
            return;
        }
        if self.is_animating() {
            log::debug!("{:?} hand busy, deferring {:?}", self.side, request);
            self.pending = Some(request);
        } else {
            self.pending = None;
            self.apply(request);
        }
    }
}

impl HandEngine for CardHand {
    fn spawn(&mut self, hand: &Hand) {
        let fade_ms = HAND_SPAWN_MS - 3.0 * HAND_SPAWN_STAGGER_MS;
        for slot in CardSlot::ALL {
            let rest = fan(self.side, slot, HAND_SPACING);
            let unit = &mut self.units[slot.index()];
            unit.face = hand.face(slot);
            unit.highlight = Highlight::None;
            unit.render_order = slot.index() as i32;
            unit.snap(Pose::hidden(offscreen(self.side, slot)));
            unit.animate_all([
                Tween::wait(slot.index() as f64 * HAND_SPAWN_STAGGER_MS),
                Tween::new(
                    Keyframe::to(rest).opacity(1.0),
                    fade_ms,
                    Easing::EaseOutBack,
                ),
            ]);
        }
        self.revealed = [false; 4];
        self.mode = HandMode::Resting;
        self.pending = None;
        self.selection.clear();
        self.blade_highlight = None;
        self.outcome = None;
        self.next_order = 4;
        log::debug!("{:?} hand spawned", self.side);
    }

    fn set_faces(&mut self, hand: &Hand) {
        for slot in CardSlot::ALL {
            self.units[slot.index()].face = hand.face(slot);
        }
        log::debug!("{:?} hand faces updated", self.side);
    }

    fn reveal(&mut self, slot: CardSlot, outcome: Option<Outcome>) {
        if self.mode == HandMode::Details {
            self.hide_details();
        }
        self.revealed[slot.index()] = true;
        self.raise(slot);
        let side = self.side;
        let reduced_motion = self.reduced_motion;
        let unit = &mut self.units[slot.index()];

        if slot != CardSlot::Blade {
            unit.retarget(Tween::new(
                Keyframe::to(result_row(side, slot)).flip(1.0).opacity(1.0),
                CARD_FLIP_MS,
                Easing::EaseOutCubic,
            ));
            return;
        }

        let outcome = outcome.unwrap_or(Outcome::Victory);
        let rest = result_row(side, slot);
        let shake = if reduced_motion {
            0.0
        } else {
            0.25 * side.sign()
        };
        let flourish = match outcome {
            Outcome::Victory => Keyframe::to(rest.with_scale(1.25)),
            Outcome::Defeat => Keyframe::to(rest).opacity(0.6),
        };
        unit.retarget(Tween::new(
            Keyframe::to(clash_point(side)).flip(1.0).opacity(1.0),
            BLADE_APPROACH_MS,
            Easing::EaseInOutQuad,
        ));
        unit.animate_all([
            Tween::new(
                Keyframe::new().rotation(Vec3::Z * shake),
                BLADE_CLASH_MS / 2.0,
                Easing::EaseOutCubic,
            ),
            Tween::new(
                Keyframe::new().rotation(Vec3::ZERO),
                BLADE_CLASH_MS / 2.0,
                Easing::EaseInQuad,
            ),
            Tween::new(flourish, BLADE_OUTCOME_MS, Easing::EaseOutBack),
        ]);
        self.blade_highlight = Some(match outcome {
            Outcome::Victory => Highlight::Victory,
            Outcome::Defeat => Highlight::Defeat,
        });
    }

    fn mark_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        let highlight = match outcome {
            Outcome::Victory => Highlight::Victory,
            Outcome::Defeat => Highlight::Defeat,
        };
        for unit in self.units.iter_mut().filter(|u| u.face.is_some()) {
            unit.highlight = highlight;
        }
    }

    fn expand(&mut self) {
        self.request(InspectRequest::Expand);
    }

    fn collapse(&mut self) {
        self.request(InspectRequest::Collapse);
    }

    fn show_details(&mut self) {
        if !self.is_ready_to_show() {
            return;
        }
        self.mode = HandMode::Details;
        self.pending = None;
        for slot in CardSlot::ALL {
            self.move_unit(slot, details_grid(self.side, slot));
        }
    }

    fn hide_details(&mut self) {
        if self.mode != HandMode::Details {
            return;
        }
        self.selection.clear();
        self.mode = HandMode::Resting;
        for slot in CardSlot::ALL {
            let home = self.home(slot);
            self.move_unit(slot, home);
        }
    }

    fn select(&mut self, slot: CardSlot) {
        if self.mode != HandMode::Details || !self.revealed[slot.index()] {
            return;
        }
        match self.selection.toggle(slot) {
            SelectionChange::Activated { previous, key } => {
                if let Some(previous) = previous {
                    self.move_unit(previous, details_grid(self.side, previous));
                }
                self.raise(key);
                self.move_unit(key, active_spot(self.side));
            }
            SelectionChange::Returned(key) => {
                self.move_unit(key, details_grid(self.side, key));
            }
        }
    }

    fn return_active_card(&mut self) {
        if let Some(slot) = self.selection.clear() {
            self.move_unit(slot, details_grid(self.side, slot));
        }
    }

    fn is_animating(&self) -> bool {
        self.units.iter().any(CardUnit::is_animating)
    }

    fn is_ready_to_show(&self) -> bool {
        matches!(self.mode, HandMode::Resting | HandMode::Expanded) && !self.is_animating()
    }

    fn is_ready_to_collapse(&self) -> bool {
        self.mode == HandMode::Details && !self.is_animating()
    }

    fn reset(&mut self) {
        for slot in CardSlot::ALL {
            let unit = &mut self.units[slot.index()];
            unit.snap(Pose::hidden(offscreen(self.side, slot)));
            unit.face = None;
            unit.highlight = Highlight::None;
            unit.render_order = 0;
        }
        self.revealed = [false; 4];
        self.mode = HandMode::Hidden;
        self.pending = None;
        self.selection.clear();
        self.blade_highlight = None;
        self.outcome = None;
        self.next_order = 0;
    }

    fn update(&mut self, dt_ms: f64) {
        for unit in &mut self.units {
            unit.update(dt_ms);
        }
        let blade = &mut self.units[CardSlot::Blade.index()];
        if !blade.is_animating() {
            if let Some(highlight) = self.blade_highlight.take() {
                blade.highlight = highlight;
            }
        }
        if !self.is_animating() {
            if let Some(request) = self.pending.take() {
                self.apply(request);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duel::{BladeCard, TacticsCard};

    fn hand() -> Hand {
        Hand {
            tactics: Some(TacticsCard::CoinToss),
            fire: Some(4),
            dodge: Some(6),
            blade: Some(BladeCard::Grapple),
        }
    }

    fn spawned() -> CardHand {
        let mut h = CardHand::new(ViewSide::Left);
        h.spawn(&hand());
        h.update(HAND_SPAWN_MS);
        h
    }

    #[test]
    fn test_spawn_fades_in_to_fan() {
        let h = spawned();
        assert_eq!(h.mode(), HandMode::Resting);
        assert!(!h.is_animating());
        for slot in CardSlot::ALL {
            let unit = h.unit(slot);
            assert_eq!(unit.pose.opacity, 1.0);
            assert!(!unit.is_face_up());
            assert_eq!(unit.pose.transform, fan(ViewSide::Left, slot, HAND_SPACING));
        }
        assert_eq!(h.unit(CardSlot::Fire).face, hand().face(CardSlot::Fire));
    }

    #[test]
    fn test_reveal_flips_and_raises() {
        let mut h = spawned();
        h.reveal(CardSlot::Fire, None);
        assert!(h.unit(CardSlot::Fire).render_order > h.unit(CardSlot::Tactics).render_order);
        h.update(CARD_FLIP_MS);
        let unit = h.unit(CardSlot::Fire);
        assert!(unit.is_face_up());
        assert_eq!(unit.pose.transform.position, result_row(ViewSide::Left, CardSlot::Fire).position);
    }

    #[test]
    fn test_blade_sequence_length_and_outcome() {
        let mut h = spawned();
        h.reveal(CardSlot::Blade, Some(Outcome::Defeat));
        let blade = h.unit(CardSlot::Blade);
        assert!((blade.remaining_ms() - BLADE_SEQUENCE_MS).abs() < 1e-9);

        h.update(BLADE_SEQUENCE_MS - 1.0);
        assert_eq!(h.unit(CardSlot::Blade).highlight, Highlight::None);
        h.update(1.0);
        assert_eq!(h.unit(CardSlot::Blade).highlight, Highlight::Defeat);
        assert!((h.unit(CardSlot::Blade).pose.opacity - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_reduced_motion_keeps_blade_timing() {
        let mut h = CardHand::new(ViewSide::Right).with_reduced_motion(true);
        h.spawn(&hand());
        h.update(HAND_SPAWN_MS);
        h.reveal(CardSlot::Blade, Some(Outcome::Victory));
        assert!((h.unit(CardSlot::Blade).remaining_ms() - BLADE_SEQUENCE_MS).abs() < 1e-9);
        h.update(BLADE_APPROACH_MS + BLADE_CLASH_MS / 2.0);
        assert_eq!(h.unit(CardSlot::Blade).pose.transform.rotation, Vec3::ZERO);
        h.update(BLADE_SEQUENCE_MS);
        assert_eq!(h.unit(CardSlot::Blade).highlight, Highlight::Victory);
    }

    #[test]
    fn test_expand_deferred_during_reveal() {
        let mut h = spawned();
        h.reveal(CardSlot::Tactics, None);
        h.expand();
        assert_eq!(h.mode(), HandMode::Resting);

        h.update(CARD_FLIP_MS);
        assert_eq!(h.mode(), HandMode::Expanded);
        // Revealed card stays put
        assert!(!h.unit(CardSlot::Tactics).is_animating());
        assert!(h.is_revealed(CardSlot::Tactics));

        h.update(INSPECT_MS);
        h.collapse();
        assert_eq!(h.mode(), HandMode::Resting);
    }

    #[test]
    fn test_details_single_active_card() {
        let mut h = spawned();
        h.reveal(CardSlot::Tactics, None);
        h.reveal(CardSlot::Fire, None);
        h.update(CARD_FLIP_MS);
        assert!(h.is_ready_to_show());

        h.show_details();
        assert_eq!(h.mode(), HandMode::Details);
        assert!(!h.is_ready_to_collapse());
        h.update(INSPECT_MS);
        assert!(h.is_ready_to_collapse());

        // Unrevealed cards cannot be activated
        h.select(CardSlot::Blade);
        assert_eq!(h.active_card(), None);

        h.select(CardSlot::Tactics);
        h.select(CardSlot::Fire);
        assert_eq!(h.active_card(), Some(CardSlot::Fire));
        h.update(INSPECT_MS);
        assert_eq!(
            h.unit(CardSlot::Tactics).pose.transform,
            details_grid(ViewSide::Left, CardSlot::Tactics)
        );
        assert_eq!(h.unit(CardSlot::Fire).pose.transform, active_spot(ViewSide::Left));

        h.select(CardSlot::Fire);
        assert_eq!(h.active_card(), None);

        h.select(CardSlot::Tactics);
        h.return_active_card();
        assert_eq!(h.active_card(), None);

        h.hide_details();
        assert_eq!(h.mode(), HandMode::Resting);
    }

    #[test]
    fn test_set_faces_keeps_pose() {
        let mut h = CardHand::new(ViewSide::Left);
        h.spawn(&Hand::default());
        h.update(HAND_SPAWN_MS);
        h.reveal(CardSlot::Tactics, None);
        h.update(100.0);
        let pose = h.unit(CardSlot::Tactics).pose;

        h.set_faces(&hand());
        assert_eq!(h.unit(CardSlot::Tactics).pose, pose);
        assert!(h.is_animating());
        h.update(CARD_FLIP_MS);
        assert!(h.is_revealed(CardSlot::Tactics));
        for slot in CardSlot::ALL {
            assert_eq!(h.unit(slot).face, hand().face(slot));
        }
    }

    #[test]
    fn test_reset_returns_to_pre_spawn() {
        let mut h = spawned();
        h.reveal(CardSlot::Blade, Some(Outcome::Victory));
        h.update(100.0);
        h.reset();
        assert_eq!(h.mode(), HandMode::Hidden);
        assert!(!h.is_animating());
        for slot in CardSlot::ALL {
            let unit = h.unit(slot);
            assert_eq!(unit.pose, Pose::hidden(offscreen(ViewSide::Left, slot)));
            assert_eq!(unit.highlight, Highlight::None);
            assert!(unit.face.is_none());
        }
        h.update(BLADE_SEQUENCE_MS);
        assert_eq!(h.unit(CardSlot::Blade).highlight, Highlight::None);
    }
}
