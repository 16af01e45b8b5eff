//! Terminal playfield: falling asteroids, the Earth line and its defenses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::resolver::{ExternalRef, TargetId};
use crate::session::{EntitySpawner, Session, SpawnOrder};
use crate::words::Tier;

pub const DEFAULT_WIDTH: u16 = 60;
pub const DEFAULT_HEIGHT: u16 = 20;
/// How long a destroyed asteroid leaves its explosion on screen
pub const EXPLOSION_TTL: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub id: TargetId,
    pub external_ref: ExternalRef,
    pub word: String,
    pub tier: Tier,
    pub x: f64,
    pub y: f64,
    /// Rows per second
    pub speed: f64,
}

impl Asteroid {
    pub fn row(&self) -> u16 {
        self.y.max(0.0).floor() as u16
    }

    pub fn col(&self) -> u16 {
        self.x.max(0.0).floor() as u16
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    pub x: f64,
    pub y: f64,
    pub word: String,
    pub remaining: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Shield,
    Hull,
}

/// Shield points soak impacts before the Earth's health does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defense {
    pub shield: u32,
    pub health: u32,
}

impl Defense {
    pub fn new(shield: u32, health: u32) -> Self {
        Self { shield, health }
    }

    pub fn absorb_impact(&mut self) -> Impact {
        if self.shield > 0 {
            self.shield -= 1;
            Impact::Shield
        } else {
            self.health = self.health.saturating_sub(1);
            Impact::Hull
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }
}

pub struct Arena {
    width: u16,
    height: u16,
    asteroids: Vec<Asteroid>,
    explosions: Vec<Explosion>,
    initial_defense: Defense,
    defense: Defense,
    rng: StdRng,
    next_ref: u64,
}

impl Arena {
    pub fn new(width: u16, height: u16, defense: Defense) -> Self {
        Self::with_rng(width, height, defense, StdRng::from_entropy())
    }

    pub fn with_rng(width: u16, height: u16, defense: Defense, rng: StdRng) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            asteroids: Vec::new(),
            explosions: Vec::new(),
            initial_defense: defense,
            defense,
            rng,
            next_ref: 0,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Asteroids whose row reaches this value have hit the Earth
    pub fn earth_line(&self) -> f64 {
        f64::from(self.height)
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn asteroid(&self, id: TargetId) -> Option<&Asteroid> {
        self.asteroids.iter().find(|a| a.id == id)
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn defense(&self) -> Defense {
        self.defense
    }

    /// Follow a terminal resize, pulling asteroids back inside the new width
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width.max(1);
        self.height = height.max(1);
        for asteroid in self.asteroids.iter_mut() {
            let max_x = max_col(self.width, &asteroid.word);
            asteroid.x = asteroid.x.min(max_x);
        }
    }

    /// Move everything forward by `dt`. Returns asteroids that hit the Earth.
    pub fn advance(&mut self, dt: Duration) -> Vec<TargetId> {
        let secs = dt.as_secs_f64();
        for asteroid in self.asteroids.iter_mut() {
            asteroid.y += asteroid.speed * secs;
        }
        self.explosions.retain_mut(|explosion| {
            explosion.remaining = explosion.remaining.saturating_sub(dt);
            !explosion.remaining.is_zero()
        });

        let earth_line = self.earth_line();
        let (hits, flying): (Vec<_>, Vec<_>) = self
            .asteroids
            .drain(..)
            .partition(|a| a.y >= earth_line);
        self.asteroids = flying;

        hits.into_iter()
            .map(|asteroid| {
                let impact = self.defense.absorb_impact();
                log::debug!("{} \"{}\" hit the {impact:?}", asteroid.id, asteroid.word);
                asteroid.id
            })
            .collect()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, Defense::new(3, 5))
    }
}

fn max_col(width: u16, word: &str) -> f64 {
    let len = unicode_width::UnicodeWidthStr::width(word) as u16;
    f64::from(width.saturating_sub(len))
}

impl EntitySpawner for Arena {
    fn spawn(&mut self, order: &SpawnOrder) -> ExternalRef {
        let max_x = max_col(self.width, &order.word);
        let x = if max_x > 0.0 {
            self.rng.gen_range(0.0..max_x)
        } else {
            0.0
        };
        let external_ref = ExternalRef(self.next_ref);
        self.next_ref += 1;
        self.asteroids.push(Asteroid {
            id: order.id,
            external_ref,
            word: order.word.clone(),
            tier: order.tier,
            x,
            y: 0.0,
            speed: order.speed,
        });
        external_ref
    }

    fn destroy(&mut self, id: TargetId, _external_ref: ExternalRef) {
        let Some(idx) = self.asteroids.iter().position(|a| a.id == id) else {
            return;
        };
        let asteroid = self.asteroids.remove(idx);
        self.explosions.push(Explosion {
            x: asteroid.x,
            y: asteroid.y,
            word: asteroid.word,
            remaining: EXPLOSION_TTL,
        });
    }

    fn clear(&mut self) {
        self.asteroids.clear();
        self.explosions.clear();
        self.defense = self.initial_defense;
    }
}

/// What one frame of play changed
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameReport {
    pub spawned: Option<TargetId>,
    pub lost: Vec<TargetId>,
    pub game_over: bool,
}

impl Session<Arena> {
    /// Run one frame: spawn clock, asteroid motion, impacts and the defeat check.
    /// Nothing moves outside the playing phase.
    pub fn update(&mut self, dt: Duration) -> FrameReport {
        let mut report = FrameReport::default();
        if !self.is_playing() {
            return report;
        }
        report.spawned = self.tick(dt);
        report.lost = self.entities_mut().advance(dt);
        for &id in &report.lost {
            self.target_collided(id);
        }
        if self.entities().defense().is_destroyed() {
            report.game_over = self.earth_destroyed();
        }
        report
    }
}
