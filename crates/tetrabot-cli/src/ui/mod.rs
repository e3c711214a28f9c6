pub use self::{board_display::*, episode_display::*};

mod board_display;
mod episode_display;

mod color {
    use ratatui::style::Color;

    pub const CYAN: Color = Color::Rgb(0, 255, 255);
    pub const YELLOW: Color = Color::Rgb(255, 255, 0);
    pub const GREEN: Color = Color::Rgb(0, 255, 0);
    pub const RED: Color = Color::Rgb(255, 0, 0);
    pub const BLUE: Color = Color::Rgb(0, 0, 255);
    pub const ORANGE: Color = Color::Rgb(255, 127, 0);
    pub const MAGENTA: Color = Color::Rgb(255, 0, 255);
    pub const GRAY: Color = Color::Rgb(127, 127, 127);
    pub const DARK_GRAY: Color = Color::Rgb(64, 64, 64);
    pub const BLACK: Color = Color::Rgb(0, 0, 0);
    pub const WHITE: Color = Color::Rgb(255, 255, 255);
}

mod style {
    use ratatui::style::{Color, Style};
    use tetrabot_engine::PieceKind;

    use super::color;

    const fn fg_bg(fg: Color, bg: Color) -> Style {
        Style::new().fg(fg).bg(bg)
    }

    const fn bg_only(color: Color) -> Style {
        Style::new().fg(color).bg(color)
    }

    pub const DEFAULT: Style = fg_bg(color::WHITE, color::BLACK);
    pub const DIM: Style = fg_bg(color::GRAY, color::BLACK);
    pub const EMPTY_DOT: Style = fg_bg(color::DARK_GRAY, color::BLACK);
    pub const LOCKED: Style = bg_only(color::GRAY);
    pub const PLAYING_BORDER: Style = fg_bg(color::WHITE, color::BLACK);
    pub const GAME_OVER_BORDER: Style = fg_bg(color::RED, color::BLACK);

    pub const fn piece(kind: PieceKind) -> Style {
        match kind {
            PieceKind::I => bg_only(color::CYAN),
            PieceKind::O => bg_only(color::YELLOW),
            PieceKind::S => bg_only(color::GREEN),
            PieceKind::Z => bg_only(color::RED),
            PieceKind::J => bg_only(color::BLUE),
            PieceKind::L => bg_only(color::ORANGE),
            PieceKind::T => bg_only(color::MAGENTA),
        }
    }
}

/// Cells are drawn two columns wide so that they look square.
const CELL_WIDTH: u16 = 2;
