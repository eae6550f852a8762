//! Environment deck engine
//!
//! Logical order is a plain stack: the card loaded first is drawn first
//! (it is pushed last). Shuffling is cosmetic and only touches the visual
//! stacking of undrawn cards.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::inspect::{InspectRequest, Selection, SelectionChange};
use crate::anim::{CardUnit, Easing, Keyframe, Pose, Transform, Tween};
use crate::consts::*;
use crate::duel::{CardFace, EnvCard};

/// Operations against the shared deck
pub trait DeckEngine {
    /// Stack cards so that `cards[0]` is on top
    fn load(&mut self, cards: &[EnvCard]);
    /// Pop the top card and fly it to the drawn row
    fn draw(&mut self) -> Option<EnvCard>;
    /// Cosmetic split-and-recombine of undrawn cards
    fn shuffle(&mut self, seed: u64);
    /// Lay drawn cards out for inspection (deferred while animating)
    fn expand(&mut self);
    fn collapse(&mut self);
    /// Toggle a drawn card (by draw position) as the active one
    fn select(&mut self, index: usize);
    fn return_active_card(&mut self);
    fn is_animating(&self) -> bool;
    fn is_ready_to_show(&self) -> bool;
    fn is_ready_to_collapse(&self) -> bool;
    /// Every card back on the stack, face-down, in load order
    fn reset(&mut self);
    /// Advance by timeline milliseconds
    fn update(&mut self, dt_ms: f64);
}

/// Layout mode of the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckMode {
    Stacked,
    Expanded,
}

fn stack_slot(height: usize) -> Transform {
    Transform::at(Vec3::new(
        DECK_X,
        DECK_Y,
        height as f32 * DECK_CARD_THICKNESS,
    ))
}

fn drawn_slot(position: usize) -> Transform {
    Transform::at(Vec3::new(
        DRAWN_ROW_X0 + position as f32 * DRAWN_SPACING,
        DRAWN_ROW_Y,
        0.0,
    ))
}

fn inspect_slot(position: usize, count: usize) -> Transform {
    let offset = position as f32 - (count.saturating_sub(1)) as f32 / 2.0;
    Transform::at(Vec3::new(offset * INSPECT_SPACING, INSPECT_ROW_Y, 1.0)).with_scale(INSPECT_SCALE)
}

fn active_spot() -> Transform {
    Transform::at(Vec3::new(0.0, INSPECT_ROW_Y, ACTIVE_Z)).with_scale(ACTIVE_SCALE)
}

/// Default deck engine over a pool of card units
#[derive(Debug, Clone)]
pub struct EnvDeck {
    units: Vec<CardUnit>,
    /// Card behind each unit (index = load order)
    cards: Vec<EnvCard>,
    /// Logical stack of unit indices, top = last
    pile: Vec<usize>,
    /// Visual stacking of undrawn units, bottom first
    visual: Vec<usize>,
    /// Drawn unit indices, in draw order
    drawn: Vec<usize>,
    mode: DeckMode,
    pending: Option<InspectRequest>,
    selection: Selection<usize>,
    reduced_motion: bool,
}

impl EnvDeck {
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            cards: Vec::new(),
            pile: Vec::new(),
            visual: Vec::new(),
            drawn: Vec::new(),
            mode: DeckMode::Stacked,
            pending: None,
            selection: Selection::default(),
            reduced_motion: false,
        }
    }

    /// Skip the shuffle animation
    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    pub fn units(&self) -> &[CardUnit] {
        &self.units
    }

    pub fn mode(&self) -> DeckMode {
        self.mode
    }

    /// Undrawn cards left
    pub fn pile_len(&self) -> usize {
        self.pile.len()
    }

    /// Next card to be drawn
    pub fn top(&self) -> Option<EnvCard> {
        self.pile.last().map(|&i| self.cards[i])
    }

    /// Undrawn cards in draw order (next first)
    pub fn draw_order(&self) -> Vec<EnvCard> {
        self.pile.iter().rev().map(|&i| self.cards[i]).collect()
    }

    /// Drawn cards, left to right
    pub fn drawn_cards(&self) -> Vec<EnvCard> {
        self.drawn.iter().map(|&i| self.cards[i]).collect()
    }

    /// Unit ids of undrawn cards as stacked on screen, bottom first
    pub fn visual_stack(&self) -> Vec<u32> {
        self.visual.iter().map(|&i| self.units[i].id).collect()
    }

    pub fn active_card(&self) -> Option<usize> {
        self.selection.active()
    }

    /// Unit for a drawn card, by draw position
    pub fn drawn_unit(&self, position: usize) -> Option<&CardUnit> {
        self.drawn.get(position).map(|&i| &self.units[i])
    }

    fn row_slot(&self, position: usize) -> Transform {
        match self.mode {
            DeckMode::Stacked => drawn_slot(position),
            DeckMode::Expanded => inspect_slot(position, self.drawn.len()),
        }
    }

    fn move_unit(&mut self, index: usize, to: Transform) {
        self.units[index].retarget(Tween::new(
            Keyframe::to(to),
            INSPECT_MS,
            Easing::EaseOutCubic,
        ));
    }

    fn restack(&mut self) {
        for (height, &index) in self.visual.iter().enumerate() {
            let unit = &mut self.units[index];
            unit.render_order = height as i32;
            unit.snap(Pose {
                transform: stack_slot(height),
                opacity: 1.0,
                flip: 0.0,
            });
        }
    }

    fn lay_out_row(&mut self) {
        if let Some(active) = self.selection.clear() {
            log::debug!("returning active deck card {}", active);
        }
        for position in 0..self.drawn.len() {
            let to = self.row_slot(position);
            self.move_unit(self.drawn[position], to);
        }
    }

    fn apply(&mut self, request: InspectRequest) {
        match (request, self.mode) {
            (InspectRequest::Expand, DeckMode::Stacked) if !self.drawn.is_empty() => {
                self.mode = DeckMode::Expanded;
            }
            (InspectRequest::Collapse, DeckMode::Expanded) => {
                self.mode = DeckMode::Stacked;
            }
            _ => return,
        }
        self.lay_out_row();
    }

    fn request(&mut self, request: InspectRequest) {
        if self.is_animating() {
            log::debug!("deck busy, deferring {:?}", request);
            self.pending = Some(request);
        } else {
            self.pending = None;
            self.apply(request);
        }
    }
}

impl Default for EnvDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckEngine for EnvDeck {
    fn load(&mut self, cards: &[EnvCard]) {
        self.cards = cards.to_vec();
        self.units = cards
            .iter()
            .enumerate()
            .map(|(i, &card)| {
                let mut unit = CardUnit::new(100 + i as u32, stack_slot(0));
                unit.face = Some(CardFace::Environment(card));
                unit
            })
            .collect();
        self.reset();
        log::debug!("deck loaded with {} cards", cards.len());
    }

    fn draw(&mut self) -> Option<EnvCard> {
        let Some(index) = self.pile.pop() else {
            log::warn!("draw from an empty environment deck");
            return None;
        };
        self.visual.retain(|&i| i != index);

        let position = self.drawn.len();
        self.drawn.push(index);
        let landing = self.row_slot(position);
        let start = self.units[index].pose.transform.position;
        let lifted = Vec3::new(start.x, start.y + DECK_LIFT, start.z + 0.5);
        let midway = (lifted + landing.position) / 2.0 + Vec3::new(0.0, DECK_LIFT / 2.0, 0.0);

        let unit = &mut self.units[index];
        unit.render_order = 1000 + position as i32;
        unit.retarget(Tween::new(
            Keyframe::new().position(lifted).opacity(1.0),
            DECK_DRAW_LIFT_MS,
            Easing::EaseOutCubic,
        ));
        unit.animate_all([
            Tween::new(
                Keyframe::new().position(midway).flip(0.5),
                DECK_DRAW_TRAVEL_MS,
                Easing::Linear,
            ),
            Tween::new(
                Keyframe::to(landing).flip(1.0),
                DECK_DRAW_LAND_MS,
                Easing::EaseOutBack,
            ),
        ]);

        if self.mode == DeckMode::Expanded {
            // The row is centred, so earlier cards shift over
            for earlier in 0..position {
                if self.selection.active() != Some(earlier) {
                    let to = self.row_slot(earlier);
                    self.move_unit(self.drawn[earlier], to);
                }
            }
        }

        let card = self.cards[index];
        log::debug!("drew {} ({} left)", card.as_str(), self.pile.len());
        Some(card)
    }

    fn shuffle(&mut self, seed: u64) {
        let count = self.visual.len();
        if count < 2 {
            return;
        }
        let mut rng = Pcg32::seed_from_u64(seed);
        let cut = rng.random_range(1..count);
        let (left, right) = self.visual.split_at(cut);
        let (mut left, mut right) = (left.to_vec(), right.to_vec());

        // Riffle the two piles back together
        let mut merged = Vec::with_capacity(count);
        left.reverse();
        right.reverse();
        while !left.is_empty() && !right.is_empty() {
            let from_left = rng.random_bool(0.5);
            let next = if from_left { left.pop() } else { right.pop() };
            merged.extend(next);
        }
        merged.extend(left.into_iter().rev());
        merged.extend(right.into_iter().rev());

        let split_sides: Vec<(usize, f32)> = self
            .visual
            .iter()
            .enumerate()
            .map(|(height, &i)| (i, if height < cut { -DECK_SPLIT_X } else { DECK_SPLIT_X }))
            .collect();
        self.visual = merged;

        if self.reduced_motion {
            self.restack();
            return;
        }
        for (index, dx) in split_sides {
            let at = self.units[index].pose.transform.position;
            self.units[index].retarget(Tween::new(
                Keyframe::new().position(Vec3::new(DECK_X + dx, at.y, at.z)),
                SHUFFLE_SPLIT_MS,
                Easing::EaseOutCubic,
            ));
        }
        for (height, &index) in self.visual.iter().enumerate() {
            let unit = &mut self.units[index];
            unit.render_order = height as i32;
            unit.animate(Tween::new(
                Keyframe::to(stack_slot(height)).flip(0.0),
                SHUFFLE_MERGE_MS,
                Easing::EaseInOutQuad,
            ));
        }
    }

    fn expand(&mut self) {
        self.request(InspectRequest::Expand);
    }

    fn collapse(&mut self) {
        self.request(InspectRequest::Collapse);
    }

    fn select(&mut self, position: usize) {
        if self.mode != DeckMode::Expanded || position >= self.drawn.len() {
            return;
        }
        match self.selection.toggle(position) {
            SelectionChange::Activated { previous, key } => {
                if let Some(previous) = previous {
                    let to = self.row_slot(previous);
                    self.move_unit(self.drawn[previous], to);
                }
                let index = self.drawn[key];
                self.units[index].render_order = 2000;
                self.move_unit(index, active_spot());
            }
            SelectionChange::Returned(key) => {
                let index = self.drawn[key];
                self.units[index].render_order = 1000 + key as i32;
                let to = self.row_slot(key);
                self.move_unit(index, to);
            }
        }
    }

    fn return_active_card(&mut self) {
        if let Some(position) = self.selection.clear() {
            let index = self.drawn[position];
            self.units[index].render_order = 1000 + position as i32;
            let to = self.row_slot(position);
            self.move_unit(index, to);
        }
    }

    fn is_animating(&self) -> bool {
        self.units.iter().any(CardUnit::is_animating)
    }

    fn is_ready_to_show(&self) -> bool {
        self.mode == DeckMode::Stacked && !self.drawn.is_empty() && !self.is_animating()
    }

    fn is_ready_to_collapse(&self) -> bool {
        self.mode == DeckMode::Expanded && !self.is_animating()
    }

    fn reset(&mut self) {
        self.pile = (0..self.cards.len()).rev().collect();
        self.visual = self.pile.clone();
        self.drawn.clear();
        self.mode = DeckMode::Stacked;
        self.pending = None;
        self.selection.clear();
        self.restack();
    }

    fn update(&mut self, dt_ms: f64) {
        for unit in &mut self.units {
            unit.update(dt_ms);
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
    use proptest::prelude::*;

    const CARDS: [EnvCard; 4] = [
        EnvCard::DamageUp,
        EnvCard::ChancesDown,
        EnvCard::SpecialNoTactics,
        EnvCard::DoubleChancesUp,
    ];

    fn loaded() -> EnvDeck {
        let mut deck = EnvDeck::new();
        deck.load(&CARDS);
        deck
    }

    #[test]
    fn test_first_loaded_is_first_drawn() {
        let mut deck = loaded();
        assert_eq!(deck.top(), Some(EnvCard::DamageUp));
        assert_eq!(deck.draw(), Some(EnvCard::DamageUp));
        assert_eq!(deck.draw(), Some(EnvCard::ChancesDown));
        assert_eq!(deck.drawn_cards(), vec![EnvCard::DamageUp, EnvCard::ChancesDown]);
        assert_eq!(deck.pile_len(), 2);
    }

    #[test]
    fn test_draw_lands_face_up_in_row() {
        let mut deck = loaded();
        deck.draw();
        deck.draw();
        assert!(deck.is_animating());
        deck.update(DECK_DRAW_MS);
        assert!(!deck.is_animating());
        for position in 0..2 {
            let unit = deck.drawn_unit(position).unwrap();
            assert!(unit.is_face_up());
            assert_eq!(unit.pose.transform, drawn_slot(position));
        }
    }

    #[test]
    fn test_draw_from_empty_deck() {
        let mut deck = EnvDeck::new();
        deck.load(&[]);
        assert_eq!(deck.draw(), None);
    }

    #[test]
    fn test_shuffle_keeps_logical_order() {
        let mut deck = loaded();
        deck.draw();
        deck.update(DECK_DRAW_MS);
        let before = deck.draw_order();
        deck.shuffle(42);
        assert_eq!(deck.draw_order(), before);
        assert!(deck.is_animating());
        deck.update(SHUFFLE_SPLIT_MS + SHUFFLE_MERGE_MS);
        assert!(!deck.is_animating());
        assert_eq!(deck.draw(), Some(EnvCard::ChancesDown));
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let mut a = loaded();
        let mut b = loaded();
        a.shuffle(7);
        b.shuffle(7);
        assert_eq!(a.visual_stack(), b.visual_stack());
    }

    #[test]
    fn test_expand_select_collapse() {
        let mut deck = loaded();
        assert!(!deck.is_ready_to_show());
        deck.draw();
        deck.draw();
        deck.draw();

        // Still flying: expansion waits
        deck.expand();
        assert_eq!(deck.mode(), DeckMode::Stacked);
        deck.update(DECK_DRAW_MS);
        assert_eq!(deck.mode(), DeckMode::Expanded);
        deck.update(INSPECT_MS);
        assert!(deck.is_ready_to_collapse());

        deck.select(0);
        deck.select(2);
        assert_eq!(deck.active_card(), Some(2));
        deck.update(INSPECT_MS);
        assert_eq!(deck.drawn_unit(2).unwrap().pose.transform, active_spot());
        assert_eq!(deck.drawn_unit(0).unwrap().pose.transform, inspect_slot(0, 3));

        deck.select(9);
        assert_eq!(deck.active_card(), Some(2));

        deck.collapse();
        assert_eq!(deck.mode(), DeckMode::Stacked);
        assert_eq!(deck.active_card(), None);
    }

    #[test]
    fn test_draw_while_expanded_recentres_row() {
        let mut deck = loaded();
        deck.draw();
        deck.update(DECK_DRAW_MS);
        deck.expand();
        deck.update(INSPECT_MS);
        assert_eq!(deck.drawn_unit(0).unwrap().pose.transform, inspect_slot(0, 1));

        deck.draw();
        deck.update(DECK_DRAW_MS);
        assert!(!deck.is_animating());
        assert_eq!(deck.drawn_unit(0).unwrap().pose.transform, inspect_slot(0, 2));
        assert_eq!(deck.drawn_unit(1).unwrap().pose.transform, inspect_slot(1, 2));
    }

    #[test]
    fn test_reset_restores_full_stack() {
        let mut deck = loaded();
        deck.draw();
        deck.shuffle(3);
        deck.reset();
        assert!(!deck.is_animating());
        assert_eq!(deck.draw_order(), CARDS.to_vec());
        assert!(deck.drawn_cards().is_empty());
        assert!(deck.units().iter().all(|u| !u.is_face_up()));
    }

    proptest! {
        #[test]
        fn prop_shuffle_never_changes_draw_order(seed in any::<u64>(), draws in 0usize..4) {
            let mut deck = loaded();
            for _ in 0..draws {
                deck.draw();
            }
            let before = deck.draw_order();
            let mut stack_before = deck.visual_stack();
            deck.shuffle(seed);
            prop_assert_eq!(deck.draw_order(), before);

            let mut stack_after = deck.visual_stack();
            stack_before.sort_unstable();
            stack_after.sort_unstable();
            prop_assert_eq!(stack_before, stack_after);
        }
    }
}
