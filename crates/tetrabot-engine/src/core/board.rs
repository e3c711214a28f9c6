use std::fmt;

use super::piece::Shape;

const FULL_ROW_MASK: u16 = (1 << Board::WIDTH) - 1;

/// One board row as a bitmask; bit `x` is column `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitRow {
    bits: u16,
}

impl BitRow {
    pub const EMPTY: Self = Self { bits: 0 };
    pub const FULL: Self = Self {
        bits: FULL_ROW_MASK,
    };

    #[inline]
    #[must_use]
    pub fn is_filled(self) -> bool {
        self.bits == FULL_ROW_MASK
    }

    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    #[inline]
    #[must_use]
    pub fn is_cell_occupied(self, x: usize) -> bool {
        self.bits & (1 << x) != 0
    }

    #[inline]
    fn overlaps(self, x0: usize, mask: u16) -> bool {
        self.bits & (mask << x0) != 0
    }

    #[inline]
    fn occupy(&mut self, x0: usize, mask: u16) {
        self.bits |= mask << x0;
    }

    /// Occupancy of each column, left to right.
    pub fn cells(self) -> impl Iterator<Item = bool> {
        (0..Board::WIDTH).map(move |x| self.is_cell_occupied(x))
    }
}

/// Playing field of locked blocks.
///
/// Row 0 is the top. The first [`Board::HIDDEN_HEIGHT`] rows are the spawn
/// area above the visible field; a block locked there ends the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    rows: [BitRow; Board::TOTAL_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Board {
    pub const WIDTH: usize = 10;
    pub const VISIBLE_HEIGHT: usize = 20;
    pub const HIDDEN_HEIGHT: usize = 2;
    pub const TOTAL_HEIGHT: usize = Self::VISIBLE_HEIGHT + Self::HIDDEN_HEIGHT;

    pub const EMPTY: Self = Self {
        rows: [BitRow::EMPTY; Self::TOTAL_HEIGHT],
    };

    /// All rows, hidden rows first.
    #[must_use]
    pub fn rows(&self) -> &[BitRow] {
        &self.rows
    }

    /// The visible rows, top to bottom.
    #[must_use]
    pub fn visible_rows(&self) -> &[BitRow] {
        &self.rows[Self::HIDDEN_HEIGHT..]
    }

    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.rows[y].is_cell_occupied(x)
    }

    /// Whether `shape` with its left edge at `column` and top at row `y`
    /// overlaps a block or leaves the field.
    #[must_use]
    pub fn collides(&self, shape: &Shape, column: usize, y: usize) -> bool {
        if column + shape.width() > Self::WIDTH || y + shape.height() > Self::TOTAL_HEIGHT {
            return true;
        }
        shape
            .rows()
            .iter()
            .zip(&self.rows[y..])
            .any(|(&mask, row)| row.overlaps(column, mask))
    }

    /// Top row `shape` comes to rest at when hard-dropped from the spawn rows
    /// at `column`, or `None` when it does not fit at spawn.
    #[must_use]
    pub fn drop_position(&self, shape: &Shape, column: usize) -> Option<usize> {
        if self.collides(shape, column, 0) {
            return None;
        }
        let mut y = 0;
        while !self.collides(shape, column, y + 1) {
            y += 1;
        }
        Some(y)
    }

    /// Locks `shape` into the board with its top-left corner at `(column, y)`.
    pub fn place(&mut self, shape: &Shape, column: usize, y: usize) {
        debug_assert!(!self.collides(shape, column, y));
        for (&mask, row) in shape.rows().iter().zip(&mut self.rows[y..]) {
            row.occupy(column, mask);
        }
    }

    /// Removes filled rows, shifting the rows above down. Returns the count.
    pub fn clear_lines(&mut self) -> usize {
        let mut count = 0;
        for y in (0..Self::TOTAL_HEIGHT).rev() {
            if self.rows[y].is_filled() {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y + count] = self.rows[y];
            }
        }
        self.rows[..count].fill(BitRow::EMPTY);
        count
    }

    /// Whether any block sits in the hidden spawn rows.
    #[must_use]
    pub fn has_hidden_blocks(&self) -> bool {
        self.rows[..Self::HIDDEN_HEIGHT]
            .iter()
            .any(|row| !row.is_empty())
    }

    /// Height of every column, measured from the floor to its topmost block.
    #[must_use]
    pub fn column_heights(&self) -> [usize; Self::WIDTH] {
        let mut heights = [0; Self::WIDTH];
        for (x, height) in heights.iter_mut().enumerate() {
            if let Some(top) = self.rows.iter().position(|row| row.is_cell_occupied(x)) {
                *height = Self::TOTAL_HEIGHT - top;
            }
        }
        heights
    }

    /// Builds a board from ASCII art, `#` for a block and `.` for empty.
    ///
    /// Rows are given top to bottom and aligned to the floor, so fewer rows
    /// than [`Board::TOTAL_HEIGHT`] describe the bottom of the field.
    ///
    /// ```
    /// use tetrabot_engine::Board;
    ///
    /// let board = Board::from_ascii(
    ///     "
    ///     ..........
    ///     #.........
    ///     #.########
    ///     ",
    /// );
    /// assert_eq!(board.column_heights()[..3], [2, 0, 1]);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if a row is not [`Board::WIDTH`] cells wide or there are too many rows.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        assert!(
            lines.len() <= Self::TOTAL_HEIGHT,
            "at most {} rows, got {}",
            Self::TOTAL_HEIGHT,
            lines.len()
        );

        let mut board = Self::EMPTY;
        let offset = Self::TOTAL_HEIGHT - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| matches!(c, '#' | '.')).collect();
            assert_eq!(
                cells.len(),
                Self::WIDTH,
                "each row must have exactly {} cells, got {} at row {i}",
                Self::WIDTH,
                cells.len(),
            );
            for (x, &c) in cells.iter().enumerate() {
                if c == '#' {
                    board.rows[offset + i].occupy(x, 1);
                }
            }
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.visible_rows() {
            for occupied in row.cells() {
                f.write_str(if occupied { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
