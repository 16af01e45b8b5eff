use crate::util::{round_to, CHARS_PER_WORD};
use crate::words::Tier;
use serde::Serialize;
use std::time::{Duration, Instant};

pub const POINTS_PER_CHAR: u64 = 10;
pub const MAX_MULTIPLIER: u32 = 5;
/// Consecutive words needed to raise the multiplier by one step
pub const STREAK_STEP: u32 = 5;

/// Snapshot of a session's score and pace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub multiplier: u32,
    pub wpm: u32,
    pub accuracy: f64,
    pub words_typed: u32,
    pub chars_typed: u32,
    pub mistakes: u32,
    pub elapsed_secs: f64,
}

/// Accumulates score, streak and typing statistics for one session
#[derive(Debug, Clone)]
pub struct ScoreLedger {
    score: u64,
    streak: u32,
    best_streak: u32,
    multiplier: u32,
    words_typed: u32,
    chars_typed: u32,
    mistakes: u32,
    started_at: Instant,
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self {
            score: 0,
            streak: 0,
            best_streak: 0,
            multiplier: 1,
            words_typed: 0,
            chars_typed: 0,
            mistakes: 0,
            started_at: Instant::now(),
        }
    }

    /// Award a completed word. Returns the points added.
    pub fn on_word_complete(&mut self, word: &str, tier: Tier) -> u64 {
        let len = word.chars().count() as u64;
        let base_points = len * POINTS_PER_CHAR;
        let points =
            (base_points as f64 * tier.score_multiplier() * f64::from(self.multiplier)).floor()
                as u64;

        self.score += points;
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        self.multiplier = multiplier_for_streak(self.streak);
        self.words_typed += 1;
        self.chars_typed += len as u32;
        points
    }

    /// A wrong keystroke wipes the whole streak bonus
    pub fn on_mistake(&mut self) {
        self.mistakes += 1;
        self.streak = 0;
        self.multiplier = 1;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn words_typed(&self) -> u32 {
        self.words_typed
    }

    pub fn chars_typed(&self) -> u32 {
        self.chars_typed
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn wpm(&self) -> u32 {
        wpm_for(self.chars_typed, self.elapsed())
    }

    pub fn accuracy(&self) -> f64 {
        accuracy_for(self.chars_typed, self.mistakes)
    }

    pub fn session_stats(&self) -> SessionStats {
        self.session_stats_at(self.elapsed())
    }

    /// Stats as they would read after `elapsed` of play
    pub fn session_stats_at(&self, elapsed: Duration) -> SessionStats {
        SessionStats {
            score: self.score,
            streak: self.streak,
            best_streak: self.best_streak,
            multiplier: self.multiplier,
            wpm: wpm_for(self.chars_typed, elapsed),
            accuracy: accuracy_for(self.chars_typed, self.mistakes),
            words_typed: self.words_typed,
            chars_typed: self.chars_typed,
            mistakes: self.mistakes,
            elapsed_secs: round_to(elapsed.as_secs_f64(), 1),
        }
    }
}

pub fn multiplier_for_streak(streak: u32) -> u32 {
    (1 + streak / STREAK_STEP).min(MAX_MULTIPLIER)
}

pub fn wpm_for(chars_typed: u32, elapsed: Duration) -> u32 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0;
    }
    ((f64::from(chars_typed) / CHARS_PER_WORD) / minutes).round() as u32
}

/// Percentage with two decimals; 100 before any keystroke was judged
pub fn accuracy_for(chars_typed: u32, mistakes: u32) -> f64 {
    let total = u64::from(chars_typed) + u64::from(mistakes);
    if total == 0 {
        return 100.0;
    }
    (chars_typed as f64 / total as f64 * 10_000.0).round() / 100.0
}
