use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use typeroids::arena::{Arena, Asteroid};
use typeroids::leaderboard::LeaderboardEntry;
use typeroids::resolver::ResolverState;
use typeroids::session::SessionPhase;
use typeroids::words::Tier;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
/// Rows outside the arena block: hud, input line and key help
const CHROME_ROWS: u16 = 3;

/// Playfield size that fits a terminal of `width` x `height`
pub fn arena_size(width: u16, height: u16) -> (u16, u16) {
    // two border columns, two border rows and the earth row
    let w = width.saturating_sub(2).max(1);
    let h = height.saturating_sub(CHROME_ROWS + 3).max(1);
    (w, h)
}

fn tier_style(tier: Tier) -> Style {
    match tier {
        Tier::Easy => Style::default().fg(Color::White),
        Tier::Moderate => Style::default().fg(Color::Yellow),
        Tier::Hard => Style::default().fg(Color::LightRed),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.session.phase() {
            SessionPhase::Menu => render_menu(self, area, buf),
            SessionPhase::Playing => render_play(self, area, buf),
            SessionPhase::Paused => {
                render_play(self, area, buf);
                render_overlay(
                    area,
                    buf,
                    vec![
                        Line::from(Span::styled(
                            "PAUSED",
                            Style::default()
                                .fg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        )),
                        Line::from(""),
                        Line::from("(tab) resume   (esc) end run"),
                    ],
                );
            }
            SessionPhase::GameOver => render_game_over(self, area, buf),
        }
    }
}

fn render_play(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_hud(app, chunks[0], buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if app.mistake_flash.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        });
    let inner = block.inner(chunks[1]);
    block.render(chunks[1], buf);
    render_arena(app, inner, buf);

    render_input(app, chunks[2], buf);

    Paragraph::new(Span::styled(
        "type to shoot  (backspace) fix  (tab) pause  (esc) end run",
        Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_hud(app: &App, area: Rect, buf: &mut Buffer) {
    let stats = app.session.stats();
    let defense = app.session.entities().defense();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut spans = vec![
        Span::styled(format!(" score {}", stats.score), bold),
        Span::raw(format!("  level {}", app.session.curve().level())),
        Span::raw(format!("  x{}", stats.multiplier)),
        Span::raw(format!("  streak {}", stats.streak)),
        Span::raw(format!("  {} wpm", stats.wpm)),
        Span::raw(format!("  {:.0}%", stats.accuracy)),
        Span::styled(
            format!("  shield {}", "◆".repeat(defense.shield as usize)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("  earth {}", "♥".repeat(defense.health as usize)),
            Style::default().fg(Color::Green),
        ),
    ];
    if let Some((text, _)) = &app.banner {
        spans.push(Span::styled(
            format!("  {text}"),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }
    Paragraph::new(Line::from(spans)).render(area, buf);
}

fn render_arena(app: &App, area: Rect, buf: &mut Buffer) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let arena = app.session.entities();
    let resolver = app.session.resolver();
    let typed = resolver.buffer();
    let candidates = resolver.candidates();

    for explosion in arena.explosions() {
        let row = explosion.y.max(0.0) as u16;
        if row >= area.height {
            continue;
        }
        let text = "*".repeat(explosion.word.width().max(1));
        let col = (explosion.x.max(0.0) as u16).min(area.width - 1);
        buf.set_stringn(
            area.x + col,
            area.y + row,
            text,
            (area.width - col) as usize,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        );
    }

    for asteroid in arena.asteroids() {
        if asteroid.row() >= area.height.saturating_sub(1) {
            continue;
        }
        let highlighted = if resolver.state() == ResolverState::Locked(asteroid.id) {
            Some(Color::Green)
        } else if candidates.contains(&asteroid.id) {
            Some(Color::Cyan)
        } else {
            None
        };
        let line = asteroid_line(asteroid, typed, highlighted);
        let col = asteroid.col().min(area.width.saturating_sub(1));
        buf.set_line(
            area.x + col,
            area.y + asteroid.row(),
            &line,
            area.width - col,
        );
    }

    render_earth(arena, area, buf);
}

fn asteroid_line<'a>(asteroid: &'a Asteroid, typed: &str, highlight: Option<Color>) -> Line<'a> {
    match highlight {
        Some(color) => {
            let split = typed.len().min(asteroid.word.len());
            Line::from(vec![
                Span::styled(
                    &asteroid.word[..split],
                    Style::default()
                        .fg(color)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                ),
                Span::styled(
                    &asteroid.word[split..],
                    tier_style(asteroid.tier).add_modifier(Modifier::BOLD),
                ),
            ])
        }
        None => Line::from(Span::styled(
            asteroid.word.as_str(),
            tier_style(asteroid.tier),
        )),
    }
}

fn render_earth(arena: &Arena, area: Rect, buf: &mut Buffer) {
    let defense = arena.defense();
    let (symbol, style) = if defense.shield > 0 {
        ("≈", Style::default().fg(Color::Cyan))
    } else {
        ("~", Style::default().fg(Color::Green))
    };
    buf.set_string(
        area.x,
        area.y + area.height - 1,
        symbol.repeat(area.width as usize),
        style,
    );
}

fn render_input(app: &App, area: Rect, buf: &mut Buffer) {
    let resolver = app.session.resolver();
    let (label, color) = match resolver.state() {
        ResolverState::Empty => ("", Color::DarkGray),
        ResolverState::Locked(_) => ("locked", Color::Green),
        ResolverState::Ambiguous => ("?", Color::Cyan),
    };
    let line = Line::from(vec![
        Span::styled(" > ", Style::default().add_modifier(Modifier::DIM)),
        Span::styled(
            resolver.buffer().to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        Span::styled(format!("  {label}"), Style::default().fg(color)),
    ]);
    Paragraph::new(line).render(area, buf);
}

fn render_overlay(area: Rect, buf: &mut Buffer, lines: Vec<Line>) {
    let height = (lines.len() as u16 + 2).min(area.height);
    let width = lines
        .iter()
        .map(|l| l.width() as u16)
        .max()
        .unwrap_or(0)
        .saturating_add(6)
        .min(area.width);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    Clear.render(rect, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(rect, buf);
}

fn high_score_lines(entries: &[LeaderboardEntry]) -> Vec<Line<'static>> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    if entries.is_empty() {
        return vec![Line::from(Span::styled("no scores yet", dim))];
    }
    entries
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(format!("{:>2}. ", entry.rank), dim),
                Span::raw(format!("{:<16}", entry.record.player_name)),
                Span::styled(
                    format!("{:>8}", entry.record.score),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", entry.created_at.format("%Y-%m-%d")), dim),
            ])
        })
        .collect()
}

fn centered_column(area: Rect, lines: Vec<Line>, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let top = area.height.saturating_sub(height) / 2;
    let rect = Rect {
        x: area.x + HORIZONTAL_MARGIN.min(area.width),
        y: area.y + top,
        width: area.width.saturating_sub(HORIZONTAL_MARGIN * 2),
        height: height.min(area.height),
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(rect, buf);
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(
            "T Y P E R O I D S",
            bold.fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from("type the word on an asteroid to destroy it"),
        Line::from(format!("pilot: {}", app.session.config().player_name)),
        Line::from(""),
        Line::from(Span::styled("(enter) launch   (esc) quit", bold)),
        Line::from(""),
        Line::from(Span::styled("high scores", bold.fg(Color::Cyan))),
    ];
    lines.extend(high_score_lines(&app.high_scores));
    if let Some(notice) = &app.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    centered_column(area, lines, buf);
}

fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let stats = app
        .session
        .final_stats()
        .cloned()
        .unwrap_or_else(|| app.session.stats());

    let mut lines = vec![
        Line::from(Span::styled("GAME OVER", bold.fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(format!("score {}", stats.score), bold)),
        Line::from(format!(
            "{} words  {} wpm  {}% acc  best streak {}",
            stats.words_typed, stats.wpm, stats.accuracy, stats.best_streak
        )),
        Line::from(format!(
            "level {}  {}s",
            app.session.curve().level(),
            stats.elapsed_secs
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(enter) again   (m) menu   (esc) quit",
            bold,
        )),
        Line::from(""),
        Line::from(Span::styled("high scores", bold.fg(Color::Cyan))),
    ];
    lines.extend(high_score_lines(&app.high_scores));
    centered_column(area, lines, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_size_leaves_room_for_chrome() {
        assert_eq!(arena_size(80, 24), (78, 18));
        assert_eq!(arena_size(1, 1), (1, 1));
    }

    #[test]
    fn test_high_score_lines_placeholder() {
        let lines = high_score_lines(&[]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_string(), "no scores yet");
    }
}
