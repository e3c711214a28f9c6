//! Reference Tetris environment for the evaluation harness.
//!
//! The crate is split in two layers:
//!
//! - [`core`] - board bitmasks and tetromino shapes
//! - [`engine`] - piece supply and [`TetrisEnv`], the [`Environment`] the
//!   harness drives
//!
//! Every turn the environment enumerates all hard-drop placements of the
//! current piece (and of the hold piece when hold is enabled) and describes
//! the board each one leads to with four features:
//!
//! | index | feature                          |
//! |-------|----------------------------------|
//! | 0     | rows cleared by the placement    |
//! | 1     | holes                            |
//! | 2     | bumpiness                        |
//! | 3     | aggregate height                 |
//!
//! # Example
//!
//! ```
//! use tetrabot_engine::{EnvConfig, TetrisEnv};
//! use tetrabot_harness::Environment as _;
//!
//! let mut env = TetrisEnv::new(EnvConfig::default(), 1);
//! let initial = env.reset();
//! assert_eq!(initial.as_slice(), [0.0; 4]);
//!
//! let next = env.next_states();
//! let (placement, _) = next.iter().next().unwrap();
//! let step = env.step(&placement.clone()).unwrap();
//! assert_eq!(step.reward, 1.0);
//! assert!(!step.done);
//! ```
//!
//! [`Environment`]: tetrabot_harness::Environment

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// A placement that is not part of the current next-state mapping.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum IllegalPlacement {
    #[display("the game is already over")]
    GameOver,
    #[display("hold is disabled")]
    HoldDisabled,
    #[display("{kind:?} has no rotation {rotation}")]
    UnknownRotation { kind: PieceKind, rotation: u8 },
    #[display("{kind:?} in rotation {rotation} does not fit at column {column}")]
    OutOfBounds {
        kind: PieceKind,
        rotation: u8,
        column: u8,
    },
    #[display("spawn rows are blocked at column {column}")]
    Blocked { column: u8 },
}
