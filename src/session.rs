//! Session lifecycle: spawning, difficulty and score bookkeeping around the
//! typing resolver.
//!
//! A [`Session`] owns every piece of per-game state. The host drives it with
//! [`Session::tick`] for time and [`Session::handle_key`] /
//! [`Session::handle_backspace`] for input, and reports entities that leave
//! play on their own via [`Session::target_collided`] and
//! [`Session::target_despawned`]. Everything the session decides is published
//! to observers as [`SessionEvent`]s.

use serde::Serialize;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::difficulty::{DifficultyConfig, DifficultyCurve};
use crate::leaderboard::{ScoreRecord, ScoreSubmitter};
use crate::resolver::{ExternalRef, ResolverEvent, TargetId, TypingResolver};
use crate::score::{ScoreLedger, SessionStats};
use crate::words::{Tier, WordSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum SessionPhase {
    Menu,
    Playing,
    Paused,
    GameOver,
}

/// What the entity layer needs to put a new asteroid on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnOrder {
    pub id: TargetId,
    pub word: String,
    pub tier: Tier,
    pub speed: f64,
}

/// The layer that owns visible entities
pub trait EntitySpawner {
    /// Create the entity for `order` and return a handle to it
    fn spawn(&mut self, order: &SpawnOrder) -> ExternalRef;
    /// The word was typed; play the destruction and drop the entity
    fn destroy(&mut self, id: TargetId, external_ref: ExternalRef);
    /// Drop every entity
    fn clear(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    Spawned(SpawnOrder),
    /// Lock, progress, candidates and reset signals, relayed untouched
    Resolver(ResolverEvent),
    Destroyed {
        id: TargetId,
        word: String,
        points: u64,
    },
    Mistake {
        ch: char,
    },
    ScoreChanged(SessionStats),
    LevelUp {
        level: u32,
    },
    /// A target left play without being typed
    TargetLost {
        id: TargetId,
    },
    GameOver(SessionStats),
}

pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

impl SessionObserver for Sender<SessionEvent> {
    fn on_event(&mut self, event: &SessionEvent) {
        // a dropped receiver just means nobody is listening any more
        let _ = self.send(event.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub player_name: String,
    pub difficulty: DifficultyConfig,
    pub submit_scores: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_name: "pilot".to_string(),
            difficulty: DifficultyConfig::default(),
            submit_scores: true,
        }
    }
}

impl From<&crate::config::Config> for SessionConfig {
    fn from(cfg: &crate::config::Config) -> Self {
        Self {
            player_name: cfg.player_name.clone(),
            difficulty: cfg.difficulty.clone(),
            submit_scores: cfg.submit_scores,
        }
    }
}

pub struct Session<S: EntitySpawner> {
    config: SessionConfig,
    phase: SessionPhase,
    resolver: TypingResolver,
    ledger: ScoreLedger,
    curve: DifficultyCurve,
    words: Box<dyn WordSource>,
    entities: S,
    observers: Vec<Box<dyn SessionObserver>>,
    submitter: Option<Box<dyn ScoreSubmitter>>,
    since_last_spawn: Duration,
    play_time: Duration,
    next_id: u64,
    final_stats: Option<SessionStats>,
}

impl<S: EntitySpawner> Session<S> {
    pub fn new(config: SessionConfig, words: Box<dyn WordSource>, entities: S) -> Self {
        let curve = DifficultyCurve::new(config.difficulty.clone());
        Self {
            config,
            phase: SessionPhase::Menu,
            resolver: TypingResolver::new(),
            ledger: ScoreLedger::new(),
            curve,
            words,
            entities,
            observers: Vec::new(),
            submitter: None,
            since_last_spawn: Duration::ZERO,
            play_time: Duration::ZERO,
            next_id: 1,
            final_stats: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_submitter(mut self, submitter: Box<dyn ScoreSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    pub fn resolver(&self) -> &TypingResolver {
        &self.resolver
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn curve(&self) -> &DifficultyCurve {
        &self.curve
    }

    pub fn entities(&self) -> &S {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut S {
        &mut self.entities
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Time spent in the playing phase this session
    pub fn play_time(&self) -> Duration {
        self.play_time
    }

    pub fn stats(&self) -> SessionStats {
        self.ledger.session_stats_at(self.play_time)
    }

    /// Stats frozen at the last game over
    pub fn final_stats(&self) -> Option<&SessionStats> {
        self.final_stats.as_ref()
    }

    /// Swap difficulty constants mid-session; level and progress are kept
    pub fn reconfigure(&mut self, difficulty: DifficultyConfig) {
        self.curve.reconfigure(difficulty.clone());
        self.config.difficulty = difficulty;
    }

    /// Begin a fresh session from the menu or after a game over
    pub fn start(&mut self) -> bool {
        if !matches!(self.phase, SessionPhase::Menu | SessionPhase::GameOver) {
            log::debug!("start ignored while {}", self.phase);
            return false;
        }
        self.ledger.reset();
        self.curve.reset();
        let events = self.resolver.clear_targets();
        self.entities.clear();
        self.final_stats = None;
        self.play_time = Duration::ZERO;
        // first asteroid arrives on the first tick
        self.since_last_spawn = self.curve.current_spawn_interval();

        self.transition(SessionPhase::Playing);
        self.dispatch(events);
        let stats = self.stats();
        self.emit(SessionEvent::ScoreChanged(stats));
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != SessionPhase::Playing {
            log::debug!("pause ignored while {}", self.phase);
            return false;
        }
        self.transition(SessionPhase::Paused);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != SessionPhase::Paused {
            log::debug!("resume ignored while {}", self.phase);
            return false;
        }
        self.transition(SessionPhase::Playing);
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            SessionPhase::Playing => self.pause(),
            SessionPhase::Paused => self.resume(),
            _ => false,
        }
    }

    /// End the session on request
    pub fn stop(&mut self) -> bool {
        self.end_session("stopped")
    }

    /// End the session because the earth has no health left
    pub fn earth_destroyed(&mut self) -> bool {
        self.end_session("earth destroyed")
    }

    pub fn return_to_menu(&mut self) -> bool {
        if self.phase != SessionPhase::GameOver {
            log::debug!("return to menu ignored while {}", self.phase);
            return false;
        }
        self.transition(SessionPhase::Menu);
        true
    }

    /// Advance the spawn clock. Returns the id of a target spawned this tick.
    pub fn tick(&mut self, dt: Duration) -> Option<TargetId> {
        if self.phase != SessionPhase::Playing {
            return None;
        }
        self.play_time += dt;
        self.since_last_spawn += dt;
        if self.since_last_spawn <= self.curve.current_spawn_interval() {
            return None;
        }
        self.since_last_spawn = Duration::ZERO;
        self.spawn()
    }

    /// Route one typed character. Returns false when input is not accepted.
    pub fn handle_key(&mut self, key: char) -> bool {
        if self.phase != SessionPhase::Playing {
            return false;
        }
        let events = self.resolver.process_key(key);
        self.dispatch(events);
        true
    }

    pub fn handle_backspace(&mut self) -> bool {
        if self.phase != SessionPhase::Playing {
            return false;
        }
        let events = self.resolver.backspace();
        self.dispatch(events);
        true
    }

    /// The entity reached the earth or shield before it was typed
    pub fn target_collided(&mut self, id: TargetId) -> bool {
        if !self.remove_external(id) {
            return false;
        }
        self.emit(SessionEvent::TargetLost { id });
        true
    }

    /// The entity left play for some other reason (off screen, cleanup)
    pub fn target_despawned(&mut self, id: TargetId) -> bool {
        self.remove_external(id)
    }

    fn remove_external(&mut self, id: TargetId) -> bool {
        if !self.resolver.contains(id) {
            return false;
        }
        let events = self.resolver.remove_target(id);
        self.dispatch(events);
        true
    }

    fn spawn(&mut self) -> Option<TargetId> {
        let tier = self.curve.current_tier();
        let word = self.words.word_for(tier);
        if word.trim().is_empty() {
            log::warn!("word source gave a blank {tier} word, skipping spawn");
            return None;
        }
        let id = TargetId(self.next_id);
        self.next_id += 1;

        let order = SpawnOrder {
            id,
            word,
            tier,
            speed: self.curve.current_enemy_speed(),
        };
        let external_ref = self.entities.spawn(&order);
        if !self.resolver.register_target(id, &order.word, external_ref) {
            log::warn!("could not register {id} \"{}\", dropping it", order.word);
            self.entities.destroy(id, external_ref);
            return None;
        }
        log::debug!(
            "spawned {id} \"{}\" ({tier}, speed {:.2})",
            order.word,
            order.speed
        );
        self.emit(SessionEvent::Spawned(order));
        Some(id)
    }

    fn end_session(&mut self, reason: &str) -> bool {
        if !matches!(self.phase, SessionPhase::Playing | SessionPhase::Paused) {
            log::debug!("game over ({reason}) ignored while {}", self.phase);
            return false;
        }
        let stats = self.stats();
        self.final_stats = Some(stats.clone());
        self.transition(SessionPhase::GameOver);
        log::info!(
            "game over ({reason}): score {} words {} accuracy {}%",
            stats.score,
            stats.words_typed,
            stats.accuracy
        );

        self.submit(&stats);

        let events = self.resolver.clear_targets();
        self.dispatch(events);
        self.entities.clear();
        self.emit(SessionEvent::GameOver(stats));
        true
    }

    fn submit(&self, stats: &SessionStats) {
        if !self.config.submit_scores {
            return;
        }
        let Some(submitter) = self.submitter.as_ref() else {
            return;
        };
        let record = ScoreRecord {
            player_name: self.config.player_name.clone(),
            score: stats.score,
            words_typed: Some(stats.words_typed),
            accuracy: Some(stats.accuracy),
            game_duration: Some(stats.elapsed_secs),
            difficulty: Some(self.curve.current_tier().to_string()),
        };
        if let Err(e) = submitter.submit(&record) {
            log::warn!("score submission failed: {e}");
        }
    }

    fn dispatch(&mut self, events: Vec<ResolverEvent>) {
        for event in events {
            match event {
                ResolverEvent::Complete {
                    id,
                    word,
                    external_ref,
                } => self.on_complete(id, word, external_ref),
                ResolverEvent::Mistake { ch } => {
                    self.ledger.on_mistake();
                    self.emit(SessionEvent::Mistake { ch });
                    let stats = self.stats();
                    self.emit(SessionEvent::ScoreChanged(stats));
                }
                relayed => self.emit(SessionEvent::Resolver(relayed)),
            }
        }
    }

    fn on_complete(&mut self, id: TargetId, word: String, external_ref: ExternalRef) {
        let tier = self.curve.current_tier();
        let points = self.ledger.on_word_complete(&word, tier);
        let leveled_up = self.curve.advance();
        self.entities.destroy(id, external_ref);

        self.emit(SessionEvent::Destroyed { id, word, points });
        if leveled_up {
            let level = self.curve.level();
            log::info!("level {level} reached");
            self.emit(SessionEvent::LevelUp { level });
        }
        let stats = self.stats();
        self.emit(SessionEvent::ScoreChanged(stats));
    }

    fn transition(&mut self, to: SessionPhase) {
        let from = self.phase;
        self.phase = to;
        log::info!("session {from} -> {to}");
        self.emit(SessionEvent::PhaseChanged { from, to });
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }
}
