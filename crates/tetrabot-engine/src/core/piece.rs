/// Tetromino type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceKind {
    I = 0,
    O = 1,
    S = 2,
    Z = 3,
    J = 4,
    L = 5,
    T = 6,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::O,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
        Self::T,
    ];

    /// Distinct rotations of this piece, in clockwise order from spawn.
    ///
    /// Rotations that only shift the occupied cells are not repeated, so
    /// `O` has one shape, `I`, `S` and `Z` have two, the rest four.
    ///
    /// ```
    /// use tetrabot_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::O.shapes().len(), 1);
    /// assert_eq!(PieceKind::S.shapes().len(), 2);
    /// assert_eq!(PieceKind::T.shapes().len(), 4);
    /// ```
    #[must_use]
    pub fn shapes(self) -> &'static [Shape] {
        SHAPES[self as usize]
    }

    /// Shape for `rotation`, if the piece has that many distinct rotations.
    #[must_use]
    pub fn shape(self, rotation: u8) -> Option<&'static Shape> {
        self.shapes().get(usize::from(rotation))
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }
}

/// Occupied cells of one piece rotation, normalized to its bounding box.
///
/// Rows are listed top to bottom; bit `x` of a row is column offset `x` from
/// the left edge of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    rows: [u16; 4],
    width: u8,
    height: u8,
}

impl Shape {
    #[expect(clippy::cast_possible_truncation)]
    const fn new(rows: &[u16]) -> Self {
        let mut masks = [0; 4];
        let mut union = 0;
        let mut i = 0;
        while i < rows.len() {
            masks[i] = rows[i];
            union |= rows[i];
            i += 1;
        }
        Self {
            rows: masks,
            width: (u16::BITS - union.leading_zeros()) as u8,
            height: rows.len() as u8,
        }
    }

    /// Row masks, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[u16] {
        &self.rows[..usize::from(self.height)]
    }

    #[must_use]
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.height)
    }

    /// Occupied `(dx, dy)` offsets inside the bounding box.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows().iter().enumerate().flat_map(|(dy, &row)| {
            (0..self.width())
                .filter(move |dx| row & (1 << dx) != 0)
                .map(move |dx| (dx, dy))
        })
    }
}

const SHAPES: [&[Shape]; PieceKind::LEN] = [
    // I
    &[
        Shape::new(&[0b1111]),
        Shape::new(&[0b1, 0b1, 0b1, 0b1]),
    ],
    // O
    &[Shape::new(&[0b11, 0b11])],
    // S
    &[
        Shape::new(&[0b110, 0b011]),
        Shape::new(&[0b01, 0b11, 0b10]),
    ],
    // Z
    &[
        Shape::new(&[0b011, 0b110]),
        Shape::new(&[0b10, 0b11, 0b01]),
    ],
    // J
    &[
        Shape::new(&[0b001, 0b111]),
        Shape::new(&[0b11, 0b01, 0b01]),
        Shape::new(&[0b111, 0b100]),
        Shape::new(&[0b10, 0b10, 0b11]),
    ],
    // L
    &[
        Shape::new(&[0b100, 0b111]),
        Shape::new(&[0b01, 0b01, 0b11]),
        Shape::new(&[0b111, 0b001]),
        Shape::new(&[0b11, 0b10, 0b10]),
    ],
    // T
    &[
        Shape::new(&[0b010, 0b111]),
        Shape::new(&[0b01, 0b11, 0b01]),
        Shape::new(&[0b111, 0b010]),
        Shape::new(&[0b10, 0b11, 0b10]),
    ],
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_shape_is_a_tetromino() {
        for kind in PieceKind::ALL {
            for shape in kind.shapes() {
                assert_eq!(shape.cells().count(), 4, "{kind:?}");
                assert!(shape.rows().iter().all(|&row| row != 0), "{kind:?}");
                assert!(shape.cells().any(|(dx, _)| dx == 0), "{kind:?}");
            }
        }
    }

    #[test]
    fn rotations_are_distinct() {
        for kind in PieceKind::ALL {
            let cells: HashSet<Vec<_>> = kind
                .shapes()
                .iter()
                .map(|shape| shape.cells().collect())
                .collect();
            assert_eq!(cells.len(), kind.shapes().len(), "{kind:?}");
        }
    }

    #[test]
    fn bounding_boxes() {
        let i = PieceKind::I.shapes();
        assert_eq!((i[0].width(), i[0].height()), (4, 1));
        assert_eq!((i[1].width(), i[1].height()), (1, 4));
        let t = PieceKind::T.shape(1).unwrap();
        assert_eq!((t.width(), t.height()), (2, 3));
        assert!(PieceKind::O.shape(1).is_none());
    }
}
