//! Animated stat numbers (health, damage, hit chance)

use serde::{Deserialize, Serialize};

use crate::duel::SideState;

/// A number that counts toward its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimatedStat {
    from: f32,
    to: f32,
    value: f32,
    elapsed: f64,
    duration: f64,
}

impl AnimatedStat {
    pub fn new(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            value,
            elapsed: 0.0,
            duration: 0.0,
        }
    }

    /// Count from the currently displayed value toward `to`
    pub fn set_target(&mut self, to: f32, duration_ms: f64) {
        self.from = self.value;
        self.to = to;
        self.elapsed = 0.0;
        self.duration = duration_ms.max(0.0);
        if self.duration == 0.0 {
            self.value = to;
        }
    }

    pub fn snap(&mut self, value: f32) {
        *self = Self::new(value);
    }

    pub fn update(&mut self, dt_ms: f64) {
        if self.value == self.to {
            return;
        }
        self.elapsed = (self.elapsed + dt_ms).min(self.duration);
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration) as f32
        } else {
            1.0
        };
        self.value = if t >= 1.0 {
            self.to
        } else {
            self.from + (self.to - self.from) * t
        };
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Rounded value for display
    pub fn display(&self) -> u8 {
        self.value.round().clamp(0.0, u8::MAX as f32) as u8
    }

    pub fn is_animating(&self) -> bool {
        self.value != self.to
    }
}

/// Displayed stats of one side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsDisplay {
    pub health: AnimatedStat,
    pub damage: AnimatedStat,
    pub hit_chance: AnimatedStat,
}

impl StatsDisplay {
    pub fn new(state: SideState) -> Self {
        Self {
            health: AnimatedStat::new(state.health as f32),
            damage: AnimatedStat::new(state.damage as f32),
            hit_chance: AnimatedStat::new(state.hit_chance as f32),
        }
    }

    pub fn set_target(&mut self, state: SideState, duration_ms: f64) {
        self.health.set_target(state.health as f32, duration_ms);
        self.damage.set_target(state.damage as f32, duration_ms);
        self.hit_chance.set_target(state.hit_chance as f32, duration_ms);
    }

    pub fn snap(&mut self, state: SideState) {
        *self = Self::new(state);
    }

    pub fn update(&mut self, dt_ms: f64) {
        self.health.update(dt_ms);
        self.damage.update(dt_ms);
        self.hit_chance.update(dt_ms);
    }

    /// Target stats (what the numbers are counting toward)
    pub fn target(&self) -> SideState {
        SideState {
            health: self.health.target() as u8,
            damage: self.damage.target() as u8,
            hit_chance: self.hit_chance.target() as u8,
        }
    }

    /// Rounded stats as currently shown
    pub fn shown(&self) -> SideState {
        SideState {
            health: self.health.display(),
            damage: self.damage.display(),
            hit_chance: self.hit_chance.display(),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.health.is_animating() || self.damage.is_animating() || self.hit_chance.is_animating()
    }
}

impl Default for StatsDisplay {
    fn default() -> Self {
        Self::new(SideState::INITIAL)
    }
}
