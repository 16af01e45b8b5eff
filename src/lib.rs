// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod arena;
pub mod config;
pub mod difficulty;
pub mod leaderboard;
pub mod resolver;
pub mod runtime;
pub mod score;
pub mod session;
pub mod util;
pub mod words;
