//! Board and piece representation.
//!
//! - [`Board`] - 10-wide bitmask rows, 20 visible plus 2 hidden spawn rows
//! - [`PieceKind`] / [`Shape`] - the seven tetrominoes and their distinct rotations

pub use self::{board::*, piece::*};

mod board;
mod piece;
