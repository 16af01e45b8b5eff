use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::error::Error;

static WORDLIST_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/wordlists");

/// Served when a tier has no usable words of its own.
pub const FALLBACK_WORDS: &[&str] = &["space", "rock", "comet", "orbit", "laser", "shield"];

/// Difficulty bucket for words, ordered from easiest to hardest
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Easy,
    Moderate,
    Hard,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Moderate, Tier::Hard];

    /// Score multiplier applied to words of this tier
    pub fn score_multiplier(&self) -> f64 {
        match self {
            Tier::Easy => 1.0,
            Tier::Moderate => 1.5,
            Tier::Hard => 2.0,
        }
    }

    fn index(&self) -> usize {
        match self {
            Tier::Easy => 0,
            Tier::Moderate => 1,
            Tier::Hard => 2,
        }
    }
}

/// Anything that can hand out a word for a given tier
pub trait WordSource {
    fn word_for(&mut self, tier: Tier) -> String;
}

/// Word list file as embedded in the binary
#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    pub fn embedded(tier: Tier) -> Result<Self, Box<dyn Error>> {
        let file_name = format!("{tier}.json");
        let file = WORDLIST_DIR
            .get_file(&file_name)
            .ok_or_else(|| format!("word list {file_name} not found"))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| format!("word list {file_name} is not utf-8"))?;
        Ok(serde_json::from_str(contents)?)
    }
}

/// Lowercase, trim, drop anything that cannot be typed letter by letter, dedupe.
pub fn sanitize_words<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for word in words {
        let word = word.as_ref().trim().to_lowercase();
        if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
            continue;
        }
        if !out.contains(&word) {
            out.push(word);
        }
    }
    out
}

/// A pool that serves every word once per pass, reshuffling between passes.
#[derive(Debug, Clone)]
struct WordCycle {
    words: Vec<String>,
    cursor: usize,
}

impl WordCycle {
    fn new(words: Vec<String>, rng: &mut StdRng) -> Self {
        let mut words = words;
        words.shuffle(rng);
        Self { words, cursor: 0 }
    }

    fn next(&mut self, rng: &mut StdRng) -> Option<String> {
        if self.words.is_empty() {
            return None;
        }
        if self.cursor >= self.words.len() {
            let previous = self.words.last().cloned();
            self.words.shuffle(rng);
            // don't open the new pass with the word that closed the old one
            let len = self.words.len();
            if len > 1 && self.words.first() == previous.as_ref() {
                self.words.swap(0, len - 1);
            }
            self.cursor = 0;
        }
        let word = self.words[self.cursor].clone();
        self.cursor += 1;
        Some(word)
    }
}

/// Default word source: one shuffled cycle per tier plus a fallback cycle
#[derive(Debug, Clone)]
pub struct ShuffledWordSource {
    pools: [WordCycle; 3],
    fallback: WordCycle,
    rng: StdRng,
}

impl ShuffledWordSource {
    pub fn from_pools(easy: Vec<String>, moderate: Vec<String>, hard: Vec<String>) -> Self {
        Self::with_rng(easy, moderate, hard, StdRng::from_entropy())
    }

    pub fn with_rng(
        easy: Vec<String>,
        moderate: Vec<String>,
        hard: Vec<String>,
        mut rng: StdRng,
    ) -> Self {
        let pools = [
            WordCycle::new(sanitize_words(easy), &mut rng),
            WordCycle::new(sanitize_words(moderate), &mut rng),
            WordCycle::new(sanitize_words(hard), &mut rng),
        ];
        let fallback = WordCycle::new(sanitize_words(FALLBACK_WORDS), &mut rng);
        Self {
            pools,
            fallback,
            rng,
        }
    }

    /// Word lists compiled into the binary. A list that fails to load is left
    /// empty and that tier is served from the fallback words.
    pub fn embedded() -> Self {
        let [easy, moderate, hard] = Tier::ALL.map(|tier| match WordList::embedded(tier) {
            Ok(list) => {
                log::debug!("loaded {} {} words", list.words.len(), list.name);
                list.words
            }
            Err(e) => {
                log::warn!("unable to load {tier} word list: {e}");
                Vec::new()
            }
        });
        Self::from_pools(easy, moderate, hard)
    }

    pub fn pool_len(&self, tier: Tier) -> usize {
        self.pools[tier.index()].words.len()
    }
}

impl WordSource for ShuffledWordSource {
    fn word_for(&mut self, tier: Tier) -> String {
        if let Some(word) = self.pools[tier.index()].next(&mut self.rng) {
            return word;
        }
        self.fallback
            .next(&mut self.rng)
            .unwrap_or_else(|| FALLBACK_WORDS[0].to_string())
    }
}
