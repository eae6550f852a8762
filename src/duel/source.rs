//! Collaborator boundary: where duel data comes from
//!
//! The ledger transport lives outside this crate. `DuelSource` is the narrow
//! contract the timeline needs; `MemorySource` backs it with JSON fixtures for
//! demos and tests.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::{Address, DuelHands, DuelId, DuelStep, Duelist, DuelistId};
use crate::consts::FULL_HEALTH;
use crate::error::{ReplayError, Result};

/// Read access to duel data plus the one write the timeline performs
pub trait DuelSource {
    /// Ordered step log. `None` means not available yet; once `Some` it never changes.
    fn duel_steps(&self, duel_id: DuelId) -> Option<Arc<[DuelStep]>>;

    /// Committed hands. Unknown cards are `None`.
    fn hands(&self, duel_id: DuelId) -> DuelHands;

    /// Duelists A and B, once known
    fn duelists(&self, duel_id: DuelId) -> Option<(Duelist, Duelist)>;

    /// Whether the duel has reached a final state on the ledger
    fn is_finished(&self, duel_id: DuelId) -> bool;

    /// Whether an address belongs to the viewer
    fn is_mine(&self, address: &Address) -> bool;

    /// Pending call-to-action flag for this duel
    fn call_to_action(&self, duel_id: DuelId) -> bool;

    /// Clear the call-to-action once a finished duel has been fully shown
    fn clear_call_to_action(&mut self, duelist_id: DuelistId);
}

/// Serialized duel fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelRecord {
    pub duel_id: DuelId,
    pub duelist_a: Duelist,
    pub duelist_b: Duelist,
    #[serde(default)]
    pub hands: DuelHands,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub call_to_action: bool,
    /// Absent while the log is still being produced
    #[serde(default)]
    pub steps: Option<Vec<DuelStep>>,
}

impl DuelRecord {
    /// Decode and range-check a fixture
    pub fn from_json(json: &str) -> Result<Self> {
        let record: DuelRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Load a fixture from disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Shape and stat ranges only; game rules are trusted
    pub fn validate(&self) -> Result<()> {
        if self.steps.as_ref().is_some_and(Vec::is_empty) {
            return Err(ReplayError::InvalidRecord(format!(
                "duel {} has an empty step log",
                self.duel_id
            )));
        }
        if self.duelist_a.id == self.duelist_b.id {
            return Err(ReplayError::InvalidRecord(format!(
                "duel {} has the same duelist on both sides",
                self.duel_id
            )));
        }
        for (index, step) in self.steps.iter().flatten().enumerate() {
            for side in [&step.side_a, &step.side_b] {
                if side.state.health > FULL_HEALTH {
                    return Err(ReplayError::InvalidStep {
                        index,
                        reason: format!("health {} above {}", side.state.health, FULL_HEALTH),
                    });
                }
                if side.state.hit_chance > 100 {
                    return Err(ReplayError::InvalidStep {
                        index,
                        reason: format!("hit chance {}%", side.state.hit_chance),
                    });
                }
                let mut seen = [false; 4];
                for slot in &side.cards_played {
                    if std::mem::replace(&mut seen[slot.index()], true) {
                        return Err(ReplayError::InvalidStep {
                            index,
                            reason: format!("{} played twice", slot),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

struct MemoryDuel {
    duelists: (Duelist, Duelist),
    hands: DuelHands,
    finished: bool,
    call_to_action: bool,
    steps: Option<Arc<[DuelStep]>>,
}

/// In-memory source backed by fixtures
#[derive(Default)]
pub struct MemorySource {
    duels: HashMap<DuelId, MemoryDuel>,
    my_addresses: Vec<Address>,
    /// Duelists whose call-to-action has been cleared, in order
    pub cleared: Vec<DuelistId>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an address as belonging to the viewer
    pub fn with_viewer(mut self, address: Address) -> Self {
        self.add_viewer(address);
        self
    }

    /// Viewer identity can change after a duel is selected (wallet connects)
    pub fn add_viewer(&mut self, address: Address) {
        if !self.my_addresses.contains(&address) {
            self.my_addresses.push(address);
        }
    }

    pub fn insert(&mut self, record: DuelRecord) {
        let duel = MemoryDuel {
            duelists: (record.duelist_a, record.duelist_b),
            hands: record.hands,
            finished: record.finished,
            call_to_action: record.call_to_action,
            steps: record.steps.map(Arc::from),
        };
        self.duels.insert(record.duel_id, duel);
    }

    /// Simulate the step log arriving after the duel was selected
    pub fn publish_steps(&mut self, duel_id: DuelId, steps: Vec<DuelStep>) {
        if let Some(duel) = self.duels.get_mut(&duel_id) {
            duel.steps = Some(Arc::from(steps));
        }
    }

    /// Simulate hands arriving or changing
    pub fn publish_hands(&mut self, duel_id: DuelId, hands: DuelHands) {
        if let Some(duel) = self.duels.get_mut(&duel_id) {
            duel.hands = hands;
        }
    }
}

impl DuelSource for MemorySource {
    fn duel_steps(&self, duel_id: DuelId) -> Option<Arc<[DuelStep]>> {
        self.duels.get(&duel_id).and_then(|d| d.steps.clone())
    }

    fn hands(&self, duel_id: DuelId) -> DuelHands {
        self.duels
            .get(&duel_id)
            .map(|d| d.hands.clone())
            .unwrap_or_default()
    }

    fn duelists(&self, duel_id: DuelId) -> Option<(Duelist, Duelist)> {
        self.duels.get(&duel_id).map(|d| d.duelists.clone())
    }

    fn is_finished(&self, duel_id: DuelId) -> bool {
        self.duels.get(&duel_id).is_some_and(|d| d.finished)
    }

    fn is_mine(&self, address: &Address) -> bool {
        self.my_addresses.contains(address)
    }

    fn call_to_action(&self, duel_id: DuelId) -> bool {
        self.duels.get(&duel_id).is_some_and(|d| d.call_to_action)
    }

    fn clear_call_to_action(&mut self, duelist_id: DuelistId) {
        for duel in self.duels.values_mut() {
            if duel.duelists.0.id == duelist_id || duel.duelists.1.id == duelist_id {
                duel.call_to_action = false;
            }
        }
        self.cleared.push(duelist_id);
    }
}
