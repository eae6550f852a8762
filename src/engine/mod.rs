//! Hand and deck engines
//!
//! Engines own card units and nothing else. They never read the playback
//! cursor or the latches; the sequencer tells them what to do and when.

pub mod deck;
pub mod hand;
pub mod inspect;

pub use deck::{DeckEngine, DeckMode, EnvDeck};
pub use hand::{CardHand, HandEngine, HandMode};
pub use inspect::{InspectRequest, Selection, SelectionChange};

use serde::{Deserialize, Serialize};

/// How a blade exchange or the whole duel ended for one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory,
    Defeat,
}
