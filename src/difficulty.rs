use crate::words::Tier;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Constants that shape the difficulty progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub base_interval_ms: u64,
    pub min_interval_ms: u64,
    pub interval_step_ms: u64,
    /// Asteroid speed at level 1, in arena rows per second
    pub base_speed: f64,
    pub speed_step: f64,
    pub moderate_from_level: u32,
    pub hard_from_level: u32,
    pub words_per_level: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 3000,
            min_interval_ms: 800,
            interval_step_ms: 250,
            base_speed: 1.0,
            speed_step: 0.25,
            moderate_from_level: 3,
            hard_from_level: 6,
            words_per_level: 5,
        }
    }
}

impl DifficultyConfig {
    /// Clamp values that would break the progression invariants
    pub fn validated(mut self) -> Self {
        self.words_per_level = self.words_per_level.max(1);
        self.min_interval_ms = self.min_interval_ms.min(self.base_interval_ms);
        self.moderate_from_level = self.moderate_from_level.max(1);
        self.hard_from_level = self.hard_from_level.max(self.moderate_from_level);
        if !self.base_speed.is_finite() || self.base_speed < 0.0 {
            self.base_speed = 0.0;
        }
        if !self.speed_step.is_finite() || self.speed_step < 0.0 {
            self.speed_step = 0.0;
        }
        self
    }
}

/// Level-keyed progression of spawn cadence, asteroid speed and word tier
#[derive(Debug, Clone)]
pub struct DifficultyCurve {
    config: DifficultyConfig,
    level: u32,
    words_typed: u32,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self::new(DifficultyConfig::default())
    }
}

impl DifficultyCurve {
    pub fn new(config: DifficultyConfig) -> Self {
        Self {
            config: config.validated(),
            level: 1,
            words_typed: 0,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn words_typed(&self) -> u32 {
        self.words_typed
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    pub fn spawn_interval(&self, level: u32) -> Duration {
        let steps = u64::from(level.max(1) - 1);
        let reduction = steps.saturating_mul(self.config.interval_step_ms);
        let interval = self
            .config
            .base_interval_ms
            .saturating_sub(reduction)
            .max(self.config.min_interval_ms);
        Duration::from_millis(interval)
    }

    pub fn enemy_speed(&self, level: u32) -> f64 {
        let steps = f64::from(level.max(1) - 1);
        self.config.base_speed + steps * self.config.speed_step
    }

    pub fn tier(&self, level: u32) -> Tier {
        if level < self.config.moderate_from_level {
            Tier::Easy
        } else if level < self.config.hard_from_level {
            Tier::Moderate
        } else {
            Tier::Hard
        }
    }

    pub fn current_spawn_interval(&self) -> Duration {
        self.spawn_interval(self.level)
    }

    pub fn current_enemy_speed(&self) -> f64 {
        self.enemy_speed(self.level)
    }

    pub fn current_tier(&self) -> Tier {
        self.tier(self.level)
    }

    /// Count one completed word. Returns true when this word finished a level.
    pub fn advance(&mut self) -> bool {
        self.words_typed += 1;
        if self.words_typed % self.config.words_per_level == 0 {
            self.level += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.level = 1;
        self.words_typed = 0;
    }

    /// Swap the constants without touching level or progress
    pub fn reconfigure(&mut self, config: DifficultyConfig) {
        self.config = config.validated();
    }
}
