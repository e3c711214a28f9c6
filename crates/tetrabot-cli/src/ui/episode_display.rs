use ratatui::{
    layout::{Constraint, Flex, Layout},
    prelude::{Buffer, Rect},
    text::Line,
    widgets::{Block, Padding, Paragraph, Widget},
};
use tetrabot_engine::TetrisEnv;
use tetrabot_harness::Reseed as _;

use super::{BoardDisplay, board_display::piece_lines, style};

const NEXT_PIECES: usize = 5;
const SIDE_PANEL_WIDTH: u16 = 22;

/// Board, held and upcoming pieces, and the running totals of an episode.
#[derive(Debug)]
pub struct EpisodeDisplay<'a> {
    env: &'a TetrisEnv,
    total_reward: f32,
}

impl<'a> EpisodeDisplay<'a> {
    pub fn new(env: &'a TetrisEnv, total_reward: f32) -> Self {
        Self { env, total_reward }
    }

    fn stats_lines(&self) -> Vec<Line<'static>> {
        let clears = self.env.clears();
        let row = |label: &str, value: String| Line::from(format!("{label:<10}{value:>10}"));
        vec![
            row("REWARD", format!("{:.0}", self.total_reward)),
            row("PIECES", self.env.placed_pieces().to_string()),
            row("LINES", self.env.total_lines().to_string()),
            Line::default(),
            row("SINGLE", clears.get(1).to_string()),
            row("DOUBLE", clears.get(2).to_string()),
            row("TRIPLE", clears.get(3).to_string()),
            row("TETRIS", clears.get(4).to_string()),
            Line::default(),
            row("SEED", self.env.seed().to_string()),
        ]
    }

    fn next_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![];
        for kind in self.env.next_pieces().take(NEXT_PIECES) {
            lines.extend(piece_lines(kind));
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for EpisodeDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &EpisodeDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.env.is_game_over() {
            style::GAME_OVER_BORDER
        } else {
            style::PLAYING_BORDER
        };
        let panel = |title: &'static str| {
            Block::bordered()
                .title(Line::from(title).centered())
                .padding(Padding::horizontal(1))
                .border_style(border)
                .style(style::DEFAULT)
        };

        let board = BoardDisplay::new(self.env.board()).block(panel("BOARD"));
        let hold_lines = self
            .env
            .held_piece()
            .map(piece_lines)
            .unwrap_or_default();

        let [left, center, right] = Layout::horizontal([
            Constraint::Length(SIDE_PANEL_WIDTH + 4),
            Constraint::Length(board.width()),
            Constraint::Length(SIDE_PANEL_WIDTH / 2 + 4),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(area);
        let [hold_area, stats_area, help_area] = Layout::vertical([
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(1),
        ])
        .areas(left);
        let [board_area] = Layout::vertical([Constraint::Length(board.height())]).areas(center);

        Paragraph::new(hold_lines)
            .block(panel("HOLD"))
            .render(hold_area, buf);
        Paragraph::new(self.stats_lines())
            .block(panel("STATS"))
            .render(stats_area, buf);
        Paragraph::new(Line::styled("r: render  q: quit", style::DIM).centered())
            .render(help_area, buf);
        board.render(board_area, buf);
        Paragraph::new(self.next_lines())
            .block(panel("NEXT"))
            .render(right, buf);
    }
}

/// Shown instead of the board while rendering is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct PausedNotice;

impl Widget for PausedNotice {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [line] = Layout::vertical([Constraint::Length(1)])
            .flex(Flex::Center)
            .areas(area);
        Paragraph::new(
            Line::styled("rendering off - press r to resume, q to quit", style::DIM).centered(),
        )
        .render(line, buf);
    }
}

#[cfg(test)]
mod tests {
    use tetrabot_engine::EnvConfig;

    use super::*;

    fn rendered(env: &TetrisEnv) -> String {
        let mut buf = Buffer::empty(Rect::new(0, 0, 100, 24));
        EpisodeDisplay::new(env, 42.0).render(buf.area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn panels_and_totals_are_drawn() {
        let env = TetrisEnv::new(EnvConfig::default(), 9);
        let screen = rendered(&env);
        for title in ["BOARD", "HOLD", "STATS", "NEXT"] {
            assert!(screen.contains(title), "missing {title} panel");
        }
        assert!(screen.contains("REWARD"));
        assert!(screen.contains("42"));
    }
}
