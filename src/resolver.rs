//! Keystroke resolution against the set of words currently on screen.
//!
//! The resolver keeps one shared input buffer. After every keystroke it asks
//! which live targets still start with the buffer: none is a mistake and wipes
//! the buffer, exactly one locks that target, several leave the input
//! ambiguous. Every operation returns the signals it produced, in emission
//! order, for the session to act on and relay.

use itertools::Itertools;
use serde::Serialize;
use std::fmt;

/// Identifier of a live target, unique for the target's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to whatever draws the target. Never interpreted by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExternalRef(pub u64);

/// A word that can currently be typed
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: TargetId,
    /// Lowercased word used for matching
    pub word: String,
    /// Word as it was registered, echoed back on completion
    pub display_word: String,
    pub external_ref: ExternalRef,
}

/// Signals produced while resolving input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResolverEvent {
    /// The buffer now identifies exactly this target
    Lock { id: TargetId },
    /// `typed` characters of the locked target's word are matched
    Progress { id: TargetId, typed: usize, ch: char },
    /// The locked word was typed in full; the target is no longer live
    Complete {
        id: TargetId,
        word: String,
        external_ref: ExternalRef,
    },
    /// `ch` matched no live target; the buffer was discarded
    Mistake { ch: char },
    /// Buffer and lock are empty
    Reset,
    /// More than one target still matches the buffer
    Candidates { ids: Vec<TargetId>, buffer: String },
}

/// Coarse view of the resolver for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Empty,
    Locked(TargetId),
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Key,
    Backspace,
}

#[derive(Debug, Default, Clone)]
pub struct TypingResolver {
    /// Live targets in registration order
    targets: Vec<Target>,
    buffer: String,
    locked: Option<TargetId>,
}

impl TypingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a word typeable. Returns false for empty words and already live ids.
    pub fn register_target(&mut self, id: TargetId, word: &str, external_ref: ExternalRef) -> bool {
        let display_word = word.trim();
        if display_word.is_empty() {
            return false;
        }
        if self.contains(id) {
            log::debug!("target {id} is already live, ignoring re-registration");
            return false;
        }
        self.targets.push(Target {
            id,
            word: display_word.to_lowercase(),
            display_word: display_word.to_string(),
            external_ref,
        });
        true
    }

    /// Drop a target. A lock on it is released first; any other input,
    /// even one that now matches nothing, is left for the next keystroke.
    pub fn remove_target(&mut self, id: TargetId) -> Vec<ResolverEvent> {
        let Some(idx) = self.position(id) else {
            return Vec::new();
        };
        let events = if self.locked == Some(id) {
            self.reset_state()
        } else {
            Vec::new()
        };
        self.targets.remove(idx);
        events
    }

    /// Drop every target and reset the input
    pub fn clear_targets(&mut self) -> Vec<ResolverEvent> {
        self.targets.clear();
        self.reset_state()
    }

    /// Feed one keystroke. Only ASCII letters count; anything else is ignored.
    pub fn process_key(&mut self, key: char) -> Vec<ResolverEvent> {
        if !key.is_ascii_alphabetic() {
            return Vec::new();
        }
        let ch = key.to_ascii_lowercase();
        self.buffer.push(ch);
        self.resolve(ch, Origin::Key)
    }

    /// Feed a key name as delivered by a host (e.g. "a", "Shift", "Enter").
    /// Anything other than a single character is ignored.
    pub fn process_input(&mut self, key: &str) -> Vec<ResolverEvent> {
        match key.chars().exactly_one() {
            Ok(c) => self.process_key(c),
            Err(_) => Vec::new(),
        }
    }

    /// Remove the last typed character and re-evaluate. Never a mistake.
    pub fn backspace(&mut self) -> Vec<ResolverEvent> {
        if self.buffer.pop().is_none() {
            return Vec::new();
        }
        match self.buffer.chars().last() {
            Some(ch) => self.resolve(ch, Origin::Backspace),
            None => self.reset_state(),
        }
    }

    /// Clear buffer and lock. Safe to call any number of times.
    pub fn reset_state(&mut self) -> Vec<ResolverEvent> {
        self.buffer.clear();
        self.locked = None;
        vec![ResolverEvent::Reset]
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn locked(&self) -> Option<TargetId> {
        self.locked
    }

    pub fn state(&self) -> ResolverState {
        match (self.buffer.is_empty(), self.locked) {
            (true, _) => ResolverState::Empty,
            (false, Some(id)) => ResolverState::Locked(id),
            (false, None) => ResolverState::Ambiguous,
        }
    }

    /// Ids of live targets whose word starts with the buffer (none while empty)
    pub fn candidates(&self) -> Vec<TargetId> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        self.matching().map(|t| t.id).collect()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn position(&self, id: TargetId) -> Option<usize> {
        self.targets.iter().position(|t| t.id == id)
    }

    fn matching(&self) -> impl Iterator<Item = &Target> + '_ {
        self.targets
            .iter()
            .filter(move |t| t.word.starts_with(self.buffer.as_str()))
    }

    fn resolve(&mut self, ch: char, origin: Origin) -> Vec<ResolverEvent> {
        let candidates: Vec<usize> = self
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.word.starts_with(self.buffer.as_str()))
            .map(|(idx, _)| idx)
            .collect();

        match candidates.as_slice() {
            [] => {
                let mut events = Vec::with_capacity(2);
                if origin == Origin::Key {
                    log::debug!("'{ch}' matches nothing after \"{}\"", self.buffer);
                    events.push(ResolverEvent::Mistake { ch });
                }
                events.extend(self.reset_state());
                events
            }
            [only] => self.lock(*only, ch, origin),
            [first, ..] => {
                // Identical words can never be told apart by typing more, so
                // the earliest registered one wins once the word is complete.
                let all_complete = candidates
                    .iter()
                    .all(|&idx| self.targets[idx].word == self.buffer);
                if all_complete {
                    return self.lock(*first, ch, origin);
                }
                self.locked = None;
                vec![ResolverEvent::Candidates {
                    ids: candidates.iter().map(|&idx| self.targets[idx].id).collect(),
                    buffer: self.buffer.clone(),
                }]
            }
        }
    }

    /// Backspace always re-announces the lock, a keystroke only when it moves.
    fn lock(&mut self, idx: usize, ch: char, origin: Origin) -> Vec<ResolverEvent> {
        let id = self.targets[idx].id;
        let typed = self.buffer.len();
        let mut events = Vec::with_capacity(4);

        if self.locked != Some(id) || origin == Origin::Backspace {
            events.push(ResolverEvent::Lock { id });
        }
        self.locked = Some(id);
        events.push(ResolverEvent::Progress { id, typed, ch });

        if typed == self.targets[idx].word.len() {
            let target = self.targets.remove(idx);
            events.push(ResolverEvent::Complete {
                id,
                word: target.display_word,
                external_ref: target.external_ref,
            });
            events.extend(self.reset_state());
        }
        events
    }
}
