//! Game flow on top of [`crate::core`].
//!
//! - [`PieceBuffer`] - seeded 7-bag piece supply with a hold slot
//! - [`BoardFeatures`] - the four board features used as state vector
//! - [`TetrisEnv`] - the [`Environment`](tetrabot_harness::Environment) implementation

pub use self::{features::*, piece_buffer::*, tetris_env::*};

mod features;
mod piece_buffer;
mod tetris_env;
