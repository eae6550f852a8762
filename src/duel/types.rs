//! Duel data: card faces, hands and the immutable step log
//!
//! Everything here arrives from the duel log already decided. Nothing in this
//! module checks game rules; it only gives the log a typed shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::side::DataSide;
use crate::consts::{FULL_HEALTH, INITIAL_DAMAGE, INITIAL_HIT_CHANCE};
use crate::error::ReplayError;

/// Match a card name loosely ("Thick Coat", "thick_coat", "ThickCoat")
fn parse_named<T: Copy>(s: &str, all: &[T], name: fn(T) -> &'static str) -> Result<T, ReplayError> {
    let wanted: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    all.iter()
        .copied()
        .find(|&card| {
            let candidate: String = name(card)
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .collect();
            candidate == wanted
        })
        .ok_or_else(|| ReplayError::UnknownCard(s.to_string()))
}

/// The four card slots every hand holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSlot {
    Tactics,
    Fire,
    Dodge,
    Blade,
}

impl CardSlot {
    pub const ALL: [CardSlot; 4] = [
        CardSlot::Tactics,
        CardSlot::Fire,
        CardSlot::Dodge,
        CardSlot::Blade,
    ];

    /// Stable index into per-slot arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            CardSlot::Tactics => 0,
            CardSlot::Fire => 1,
            CardSlot::Dodge => 2,
            CardSlot::Blade => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardSlot::Tactics => "Tactics",
            CardSlot::Fire => "Fire",
            CardSlot::Dodge => "Dodge",
            CardSlot::Blade => "Blade",
        }
    }

    /// Tactics, fire and dodge reveal together; blade waits for the settle delay
    #[inline]
    pub fn reveals_in_pair(self) -> bool {
        self != CardSlot::Blade
    }
}

impl FromStr for CardSlot {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Self::ALL, Self::as_str)
    }
}

impl fmt::Display for CardSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tactics cards (played before the paces begin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticsCard {
    CoinToss,
    Vengeful,
    ThickCoat,
    Insult,
    Reversal,
    Bananas,
}

impl TacticsCard {
    pub const ALL: [TacticsCard; 6] = [
        TacticsCard::CoinToss,
        TacticsCard::Vengeful,
        TacticsCard::ThickCoat,
        TacticsCard::Insult,
        TacticsCard::Reversal,
        TacticsCard::Bananas,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TacticsCard::CoinToss => "Coin Toss",
            TacticsCard::Vengeful => "Vengeful",
            TacticsCard::ThickCoat => "Thick Coat",
            TacticsCard::Insult => "Insult",
            TacticsCard::Reversal => "Reversal",
            TacticsCard::Bananas => "Bananas",
        }
    }
}

impl FromStr for TacticsCard {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Self::ALL, Self::as_str)
    }
}

/// Blade cards (played after the last pace)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BladeCard {
    Seppuku,
    PocketPistol,
    Behead,
    Grapple,
}

impl BladeCard {
    pub const ALL: [BladeCard; 4] = [
        BladeCard::Seppuku,
        BladeCard::PocketPistol,
        BladeCard::Behead,
        BladeCard::Grapple,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BladeCard::Seppuku => "Seppuku",
            BladeCard::PocketPistol => "Pocket Pistol",
            BladeCard::Behead => "Behead",
            BladeCard::Grapple => "Grapple",
        }
    }
}

impl FromStr for BladeCard {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Self::ALL, Self::as_str)
    }
}

/// Environment cards drawn from the shared deck, one per pace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvCard {
    DamageUp,
    DamageDown,
    ChancesUp,
    ChancesDown,
    DoubleDamageUp,
    DoubleChancesUp,
    SpecialAllShotsHit,
    SpecialAllShotsMiss,
    SpecialDoubleTactics,
    SpecialNoTactics,
}

impl EnvCard {
    pub const ALL: [EnvCard; 10] = [
        EnvCard::DamageUp,
        EnvCard::DamageDown,
        EnvCard::ChancesUp,
        EnvCard::ChancesDown,
        EnvCard::DoubleDamageUp,
        EnvCard::DoubleChancesUp,
        EnvCard::SpecialAllShotsHit,
        EnvCard::SpecialAllShotsMiss,
        EnvCard::SpecialDoubleTactics,
        EnvCard::SpecialNoTactics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnvCard::DamageUp => "Damage Up",
            EnvCard::DamageDown => "Damage Down",
            EnvCard::ChancesUp => "Chances Up",
            EnvCard::ChancesDown => "Chances Down",
            EnvCard::DoubleDamageUp => "Double Damage Up",
            EnvCard::DoubleChancesUp => "Double Chances Up",
            EnvCard::SpecialAllShotsHit => "All Shots Hit",
            EnvCard::SpecialAllShotsMiss => "All Shots Miss",
            EnvCard::SpecialDoubleTactics => "Double Tactics",
            EnvCard::SpecialNoTactics => "No Tactics",
        }
    }

    /// Special cards get a gold frame
    pub fn is_special(self) -> bool {
        matches!(
            self,
            EnvCard::SpecialAllShotsHit
                | EnvCard::SpecialAllShotsMiss
                | EnvCard::SpecialDoubleTactics
                | EnvCard::SpecialNoTactics
        )
    }
}

impl FromStr for EnvCard {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Self::ALL, Self::as_str)
    }
}

/// What a card unit shows when face-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFace {
    /// Fire at the given pace (1..=10)
    Fire(u8),
    /// Dodge at the given pace (1..=10)
    Dodge(u8),
    Tactics(TacticsCard),
    Blade(BladeCard),
    Environment(EnvCard),
}

impl CardFace {
    pub fn label(&self) -> String {
        match self {
            CardFace::Fire(pace) => format!("Fire {}", pace),
            CardFace::Dodge(pace) => format!("Dodge {}", pace),
            CardFace::Tactics(card) => card.as_str().to_string(),
            CardFace::Blade(card) => card.as_str().to_string(),
            CardFace::Environment(card) => card.as_str().to_string(),
        }
    }
}

/// A duelist's four committed cards. Any entry may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    #[serde(default)]
    pub tactics: Option<TacticsCard>,
    /// Fire pace
    #[serde(default)]
    pub fire: Option<u8>,
    /// Dodge pace
    #[serde(default)]
    pub dodge: Option<u8>,
    #[serde(default)]
    pub blade: Option<BladeCard>,
}

impl Hand {
    /// Face for a slot, if known
    pub fn face(&self, slot: CardSlot) -> Option<CardFace> {
        match slot {
            CardSlot::Tactics => self.tactics.map(CardFace::Tactics),
            CardSlot::Fire => self.fire.map(CardFace::Fire),
            CardSlot::Dodge => self.dodge.map(CardFace::Dodge),
            CardSlot::Blade => self.blade.map(CardFace::Blade),
        }
    }

    /// True when no card is known (withdrew, abandoned or never committed)
    pub fn is_empty(&self) -> bool {
        CardSlot::ALL.iter().all(|&slot| self.face(slot).is_none())
    }
}

/// Resulting stats of one side after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideState {
    /// 0..=3
    pub health: u8,
    pub damage: u8,
    /// Percent, 0..=100
    pub hit_chance: u8,
}

impl SideState {
    /// Stats before the first step
    pub const INITIAL: SideState = SideState {
        health: FULL_HEALTH,
        damage: INITIAL_DAMAGE,
        hit_chance: INITIAL_HIT_CHANCE,
    };

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health == 0
    }
}

impl Default for SideState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// One side's part of a step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStep {
    /// Cards played this step (usually none or one)
    #[serde(default)]
    pub cards_played: Vec<CardSlot>,
    #[serde(default)]
    pub state: SideState,
}

impl SideStep {
    pub fn played(&self, slot: CardSlot) -> bool {
        self.cards_played.contains(&slot)
    }
}

/// One immutable record of card play and resulting stats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelStep {
    /// Present on draw steps, absent on pure reveal steps
    #[serde(default)]
    pub environment_card: Option<EnvCard>,
    pub side_a: SideStep,
    pub side_b: SideStep,
}

impl DuelStep {
    pub fn side(&self, side: DataSide) -> &SideStep {
        match side {
            DataSide::A => &self.side_a,
            DataSide::B => &self.side_b,
        }
    }
}

/// Both committed hands, in data (A/B) terms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelHands {
    #[serde(default)]
    pub a: Hand,
    #[serde(default)]
    pub b: Hand,
}

/// Duel identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuelId(pub u64);

impl fmt::Display for DuelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Duelist identity (the profile taking part, not the wallet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuelistId(pub u64);

/// Account address of a duelist's owner
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
}

/// A participant in a duel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duelist {
    pub id: DuelistId,
    pub address: Address,
}
