//! Duel data model
//!
//! Immutable inputs to the timeline:
//! - `types`: cards, hands, steps and identities
//! - `side`: A/B versus left/right and the per-duel mapping
//! - `stage`: derived status for the surrounding UI
//! - `source`: the collaborator contract that supplies all of the above

pub mod side;
pub mod source;
pub mod stage;
pub mod types;

pub use side::{DataSide, SideMapping, ViewPair, ViewSide};
pub use source::{DuelRecord, DuelSource, MemorySource};
pub use stage::{CompletedStages, DuelStage};
pub use types::{
    Address, BladeCard, CardFace, CardSlot, DuelHands, DuelId, DuelStep, Duelist, DuelistId,
    EnvCard, Hand, SideState, SideStep, TacticsCard,
};
