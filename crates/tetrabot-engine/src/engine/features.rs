use tetrabot_harness::StateVector;

use crate::Board;

/// Board summary the policies score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardFeatures {
    /// Rows removed by the placement that produced the board.
    pub lines_cleared: usize,
    /// Empty cells with a block somewhere above them in the same column.
    pub holes: usize,
    /// Sum of height differences between neighboring columns.
    pub bumpiness: usize,
    /// Sum of all column heights.
    pub aggregate_height: usize,
}

impl BoardFeatures {
    /// Length of [`Self::to_state`].
    pub const LEN: usize = 4;

    /// Measures `board`, which has already had `lines_cleared` rows removed.
    ///
    /// ```
    /// use tetrabot_engine::{Board, BoardFeatures};
    ///
    /// let board = Board::from_ascii(
    ///     "
    ///     .#........
    ///     #.#.......
    ///     ",
    /// );
    /// let features = BoardFeatures::measure(&board, 0);
    /// assert_eq!(features.holes, 1);
    /// assert_eq!(features.aggregate_height, 4);
    /// assert_eq!(features.bumpiness, 1 + 1 + 1);
    /// ```
    #[must_use]
    pub fn measure(board: &Board, lines_cleared: usize) -> Self {
        let heights = board.column_heights();
        let aggregate_height = heights.iter().sum();
        let bumpiness = heights.windows(2).map(|w| w[0].abs_diff(w[1])).sum();

        let mut holes = 0;
        for (x, &height) in heights.iter().enumerate() {
            let top = Board::TOTAL_HEIGHT - height;
            holes += (top..Board::TOTAL_HEIGHT)
                .filter(|&y| !board.is_occupied(x, y))
                .count();
        }

        Self {
            lines_cleared,
            holes,
            bumpiness,
            aggregate_height,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn to_state(self) -> StateVector {
        StateVector::from([
            self.lines_cleared as f32,
            self.holes as f32,
            self.bumpiness as f32,
            self.aggregate_height as f32,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_measures_zero() {
        assert_eq!(
            BoardFeatures::measure(&Board::EMPTY, 0),
            BoardFeatures::default()
        );
    }

    #[test]
    fn holes_count_every_covered_gap() {
        let board = Board::from_ascii(
            "
            ###.......
            ...#......
            #.#.......
            ",
        );
        let features = BoardFeatures::measure(&board, 2);
        assert_eq!(features.lines_cleared, 2);
        // one gap under columns 0, 2 and 3, two under column 1
        assert_eq!(features.holes, 5);
        assert_eq!(features.aggregate_height, 3 + 3 + 3 + 2);
        assert_eq!(features.bumpiness, 1 + 2);
    }
}
