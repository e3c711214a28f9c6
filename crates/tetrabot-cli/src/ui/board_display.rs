use ratatui::{
    prelude::{Buffer, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Widget},
};
use tetrabot_engine::{Board, PieceKind, Shape};

use super::{CELL_WIDTH, style};

/// Visible part of the playing field; locked blocks carry no piece color.
#[derive(Debug)]
pub struct BoardDisplay<'a> {
    board: &'a Board,
    block: Option<Block<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board, block: None }
    }

    pub fn block(self, block: Block<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn width(&self) -> u16 {
        Board::WIDTH as u16 * CELL_WIDTH + margin(self.block.as_ref()).0
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn height(&self) -> u16 {
        Board::VISIBLE_HEIGHT as u16 + margin(self.block.as_ref()).1
    }

    fn text(&self) -> Text<'static> {
        self.board
            .visible_rows()
            .iter()
            .map(|row| {
                row.cells()
                    .map(|occupied| {
                        if occupied {
                            Span::styled("  ", style::LOCKED)
                        } else {
                            Span::styled(" .", style::EMPTY_DOT)
                        }
                    })
                    .collect::<Line>()
            })
            .collect()
    }
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut paragraph = Paragraph::new(self.text());
        if let Some(block) = &self.block {
            paragraph = paragraph.block(block.clone());
        }
        paragraph.render(area, buf);
    }
}

/// Spawn orientation of a piece, in its color.
pub fn piece_lines(kind: PieceKind) -> Vec<Line<'static>> {
    let Some(shape) = kind.shape(0) else {
        return vec![];
    };
    shape_lines(shape, style::piece(kind))
}

fn shape_lines(shape: &Shape, filled: Style) -> Vec<Line<'static>> {
    shape
        .rows()
        .iter()
        .map(|&mask| {
            (0..shape.width())
                .map(|x| {
                    if mask & (1 << x) != 0 {
                        Span::styled("  ", filled)
                    } else {
                        Span::raw("  ")
                    }
                })
                .collect()
        })
        .collect()
}

/// Horizontal and vertical space taken by the block's borders and padding.
pub(super) fn margin(block: Option<&Block<'_>>) -> (u16, u16) {
    let outer = Rect::new(0, 0, 100, 100);
    let inner = block.map_or(outer, |block| block.inner(outer));
    (outer.width - inner.width, outer.height - inner.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bordered_board_adds_two_cells_each_way() {
        let display = BoardDisplay::new(&Board::EMPTY).block(Block::bordered());
        assert_eq!(display.width(), 22);
        assert_eq!(display.height(), 22);
    }

    #[test]
    fn occupied_cells_are_drawn_solid() {
        let board = Board::from_ascii("#.........\n##########");
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 20));
        BoardDisplay::new(&board).render(buf.area, &mut buf);

        assert_eq!(buf[(1, 18)].symbol(), " ");
        assert_eq!(buf[(1, 18)].style().bg, style::LOCKED.bg);
        assert_eq!(buf[(3, 18)].symbol(), ".");
        assert_eq!(buf[(19, 19)].style().bg, style::LOCKED.bg);
    }

    #[test]
    fn spawn_orientation_of_t() {
        let lines = piece_lines(PieceKind::T);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.width() == 6));
    }
}
