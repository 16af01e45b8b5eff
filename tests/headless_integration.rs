use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};

use typeroids::arena::{Arena, Defense};
use typeroids::leaderboard::{LeaderboardDb, ScoreSubmitter};
use typeroids::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use typeroids::session::{Session, SessionConfig, SessionEvent, SessionPhase};
use typeroids::words::{ShuffledWordSource, Tier};

const FRAME: Duration = Duration::from_millis(50);

fn press(c: char) -> GameEvent {
    GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn single_word_session(word: &str, defense: Defense) -> Session<Arena> {
    let pool = || vec![word.to_string()];
    let words = ShuffledWordSource::with_rng(pool(), pool(), pool(), StdRng::seed_from_u64(11));
    let arena = Arena::with_rng(40, 12, defense, StdRng::seed_from_u64(5));
    Session::new(SessionConfig::default(), Box::new(words), arena)
}

// Headless integration using the runtime and a session without a TTY.
// Keys and ticks come through Runner/TestEventSource like the real loop.
#[test]
fn headless_typing_destroys_asteroid() {
    let mut session = single_word_session("comet", Defense::new(3, 5));
    let (obs_tx, obs_rx) = mpsc::channel();
    session.add_observer(Box::new(obs_tx));
    session.start();

    // first frame spawns
    let spawned = session.update(FRAME).spawned.expect("first frame spawns");

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    for c in "comet".chars() {
        tx.send(press(c)).unwrap();
    }

    for _ in 0..100u32 {
        match runner.step() {
            GameEvent::Tick => {
                session.update(FRAME);
            }
            GameEvent::Resize(w, h) => session.entities_mut().resize(w, h),
            GameEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    session.handle_key(c);
                }
            }
        }
        if session.ledger().words_typed() == 1 {
            break;
        }
    }

    assert_eq!(session.ledger().score(), 50);
    assert!(!session.resolver().contains(spawned));
    assert!(session.entities().asteroid(spawned).is_none());
    assert_eq!(session.entities().explosions().len(), 1);

    let events: Vec<SessionEvent> = obs_rx.try_iter().collect();
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::Destroyed { id, points: 50, .. } if *id == spawned
    )));
}

#[test]
fn headless_full_game_reaches_leaderboard() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("scores.db");

    {
        let db = LeaderboardDb::open(&db_path).unwrap();
        let mut session = single_word_session("moon", Defense::new(1, 1))
            .with_submitter(Box::new(db));
        session.start();

        // type the first two asteroids, then let the rest fall
        let mut typed = 0;
        for _ in 0..2000 {
            let report = session.update(FRAME);
            if report.spawned.is_some() && typed < 2 {
                for c in "moon".chars() {
                    session.handle_key(c);
                }
                typed += 1;
            }
            if report.game_over {
                break;
            }
        }
        assert_eq!(session.phase(), SessionPhase::GameOver);
        let stats = session.final_stats().unwrap();
        assert_eq!(stats.words_typed, 2);
        assert_eq!(stats.score, 80);
        assert_eq!(stats.accuracy, 100.0);
    }

    let db = LeaderboardDb::open(&db_path).unwrap();
    let top = db.fetch_leaderboard(10).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].rank, 1);
    assert_eq!(top[0].record.player_name, "pilot");
    assert_eq!(top[0].record.score, 80);
    assert_eq!(top[0].record.words_typed, Some(2));
    assert_eq!(top[0].record.difficulty.as_deref(), Some("easy"));
}

#[test]
fn headless_paused_game_stands_still() {
    let mut session = single_word_session("star", Defense::new(0, 1));
    session.start();
    let id = session.update(FRAME).spawned.unwrap();
    let y = session.entities().asteroid(id).unwrap().y;

    session.pause();
    for _ in 0..100 {
        let report = session.update(FRAME);
        assert!(report.spawned.is_none());
        assert!(report.lost.is_empty());
    }
    assert_eq!(session.entities().asteroid(id).unwrap().y, y);

    session.resume();
    session.update(FRAME);
    assert!(session.entities().asteroid(id).unwrap().y > y);
}

#[test]
fn headless_levels_raise_tier() {
    let mut session = single_word_session("sun", Defense::new(10, 10));
    let mut difficulty = session.config().difficulty.clone();
    difficulty.words_per_level = 1;
    session.reconfigure(difficulty);
    session.start();

    let mut tiers = Vec::new();
    let (obs_tx, obs_rx) = mpsc::channel();
    session.add_observer(Box::new(obs_tx));
    for _ in 0..6 {
        // jump straight to the next spawn
        let spawned = session.update(Duration::from_secs(5)).spawned;
        assert!(spawned.is_some());
        for c in "sun".chars() {
            session.handle_key(c);
        }
    }
    for event in obs_rx.try_iter() {
        if let SessionEvent::Spawned(order) = event {
            tiers.push(order.tier);
        }
    }
    assert_eq!(
        tiers,
        vec![
            Tier::Easy,
            Tier::Easy,
            Tier::Moderate,
            Tier::Moderate,
            Tier::Moderate,
            Tier::Hard
        ]
    );
    assert_eq!(session.curve().level(), 7);
}
