// Minimal integration test that drives the compiled binary through a PTY.
// This exercises the real event loop and crossterm input handling across
// the main boundaries without relying on internal modules.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Marked Unix-only and ignored by default to avoid CI/platform issues.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_starts_ends_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    // Resolve path to compiled binary (debug build during tests)
    let bin = assert_cmd::cargo::cargo_bin("typeroids");
    let cmd = format!("{} --no-submit --log-level off", bin.display());

    // Spawn the TUI inside a pseudo terminal
    let mut p = spawn(cmd)?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // Launch from the menu and let a few frames run
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(300));

    // Type something; a miss is fine, the loop just has to survive it
    p.send("zz")?;
    std::thread::sleep(Duration::from_millis(100));

    // First ESC ends the run, second quits from the game over screen
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("\x1b")?;

    // Wait for the program to terminate cleanly
    p.expect(Eof)?;
    Ok(())
}

#[test]
fn leaderboard_flag_prints_without_a_tty() {
    // a fresh HOME keeps the real score file out of it
    let home = tempfile::tempdir().unwrap();
    let output = assert_cmd::Command::cargo_bin("typeroids")
        .unwrap()
        .env("HOME", home.path())
        .args(["--leaderboard", "3", "--log-level", "off"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no scores yet"));
}
