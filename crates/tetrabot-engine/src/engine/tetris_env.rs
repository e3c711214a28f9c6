use arrayvec::ArrayVec;
use tetrabot_harness::{ClearCounts, Environment, NextStates, Reseed, StateVector, Step};

use crate::{Board, BoardFeatures, IllegalPlacement, PieceBuffer, PieceKind, Shape};

/// Reward added for every placed piece.
pub const PLACEMENT_REWARD: f32 = 1.0;
/// Reward subtracted when a placement ends the game.
pub const GAME_OVER_PENALTY: f32 = 2.0;

/// One legal placement: optionally hold first, then hard-drop the piece in
/// play with the given rotation at the given left column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placement {
    pub hold: bool,
    pub rotation: u8,
    pub column: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvConfig {
    /// Also offer the placements of the piece obtained by holding.
    pub hold_enabled: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self { hold_enabled: true }
    }
}

/// Reward for a placement clearing `lines` rows, before any game-over penalty.
///
/// ```
/// use tetrabot_engine::placement_reward;
///
/// assert_eq!(placement_reward(0), 1.0);
/// assert_eq!(placement_reward(1), 11.0);
/// assert_eq!(placement_reward(4), 161.0);
/// ```
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn placement_reward(lines: usize) -> f32 {
    PLACEMENT_REWARD + (lines * lines * Board::WIDTH) as f32
}

/// Tetris game exposed as an [`Environment`].
///
/// Piece order comes from a [`PieceBuffer`] seeded at every [`reset`]; the
/// seed is changed through [`Reseed`]. The environment is headless: the
/// render flag is tracked here but drawing is left to wrappers.
///
/// [`reset`]: Environment::reset
#[derive(Debug, Clone)]
pub struct TetrisEnv {
    config: EnvConfig,
    seed: u64,
    board: Board,
    pieces: PieceBuffer,
    current: PieceKind,
    game_over: bool,
    score: f32,
    placed: usize,
    clears: ClearCounts,
    render_enabled: bool,
}

impl TetrisEnv {
    /// Creates an environment ready to play with piece order from `seed`.
    #[must_use]
    pub fn new(config: EnvConfig, seed: u64) -> Self {
        let mut pieces = PieceBuffer::with_seed(seed);
        let current = pieces.pop_next();
        Self {
            config,
            seed,
            board: Board::EMPTY,
            pieces,
            current,
            game_over: false,
            score: 0.0,
            placed: 0,
            clears: ClearCounts::default(),
            render_enabled: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> EnvConfig {
        self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn current_piece(&self) -> PieceKind {
        self.current
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.pieces.held_piece()
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.pieces.next_pieces()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Sum of the rewards since the last reset.
    #[must_use]
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Pieces locked since the last reset.
    #[must_use]
    pub fn placed_pieces(&self) -> usize {
        self.placed
    }

    #[must_use]
    pub fn clears(&self) -> ClearCounts {
        self.clears
    }

    /// Total rows cleared since the last reset.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        (1..=4).map(|lines| lines * self.clears.get(lines)).sum()
    }

    /// Piece each hold value brings into play.
    fn candidates(&self) -> ArrayVec<(bool, PieceKind), 2> {
        let mut candidates = ArrayVec::new();
        candidates.push((false, self.current));
        if self.config.hold_enabled {
            candidates.push((true, self.pieces.peek_hold_result()));
        }
        candidates
    }

    fn resolve(&self, placement: Placement) -> Result<(&'static Shape, usize), IllegalPlacement> {
        if self.game_over {
            return Err(IllegalPlacement::GameOver);
        }
        if placement.hold && !self.config.hold_enabled {
            return Err(IllegalPlacement::HoldDisabled);
        }
        let kind = if placement.hold {
            self.pieces.peek_hold_result()
        } else {
            self.current
        };
        let shape = kind
            .shape(placement.rotation)
            .ok_or(IllegalPlacement::UnknownRotation {
                kind,
                rotation: placement.rotation,
            })?;
        let column = usize::from(placement.column);
        if column + shape.width() > Board::WIDTH {
            return Err(IllegalPlacement::OutOfBounds {
                kind,
                rotation: placement.rotation,
                column: placement.column,
            });
        }
        let y = self
            .board
            .drop_position(shape, column)
            .ok_or(IllegalPlacement::Blocked {
                column: placement.column,
            })?;
        Ok((shape, y))
    }
}

impl Environment for TetrisEnv {
    type Action = Placement;
    type Error = IllegalPlacement;

    fn state_size(&self) -> usize {
        BoardFeatures::LEN
    }

    fn reset(&mut self) -> StateVector {
        self.pieces = PieceBuffer::with_seed(self.seed);
        self.current = self.pieces.pop_next();
        self.board = Board::EMPTY;
        self.game_over = false;
        self.score = 0.0;
        self.placed = 0;
        self.clears = ClearCounts::default();
        BoardFeatures::measure(&self.board, 0).to_state()
    }

    /// Placements ordered by hold, then rotation, then column.
    fn next_states(&self) -> NextStates<Placement> {
        let mut next = NextStates::with_capacity(2 * 4 * Board::WIDTH);
        if self.game_over {
            return next;
        }
        for (hold, kind) in self.candidates() {
            for (rotation, shape) in (0_u8..).zip(kind.shapes()) {
                for column in 0..=(Board::WIDTH - shape.width()) {
                    let Some(y) = self.board.drop_position(shape, column) else {
                        continue;
                    };
                    let mut board = self.board;
                    board.place(shape, column, y);
                    let lines = board.clear_lines();
                    #[expect(clippy::cast_possible_truncation)]
                    let placement = Placement {
                        hold,
                        rotation,
                        column: column as u8,
                    };
                    next.push(placement, BoardFeatures::measure(&board, lines).to_state());
                }
            }
        }
        next
    }

    fn step(&mut self, placement: &Placement) -> Result<Step, IllegalPlacement> {
        let (shape, y) = self.resolve(*placement)?;
        if placement.hold {
            self.current = self.pieces.hold(self.current);
        }

        self.board.place(shape, usize::from(placement.column), y);
        let lines = self.board.clear_lines();
        self.clears.record(lines);
        self.placed += 1;

        let mut reward = placement_reward(lines);
        if self.board.has_hidden_blocks() {
            self.game_over = true;
            reward -= GAME_OVER_PENALTY;
            tracing::debug!(placed = self.placed, score = self.score + reward, "lock out");
        } else {
            self.current = self.pieces.pop_next();
        }
        self.score += reward;

        Ok(Step {
            reward,
            done: self.game_over,
            cleared_lines: lines,
        })
    }

    fn render_enabled(&self) -> bool {
        self.render_enabled
    }

    fn toggle_render(&mut self) {
        self.render_enabled = !self.render_enabled;
    }
}

impl Reseed for TetrisEnv {
    fn seed(&self) -> u64 {
        self.seed
    }

    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(board: Board, current: PieceKind, hold_enabled: bool) -> TetrisEnv {
        let mut env = TetrisEnv::new(EnvConfig { hold_enabled }, 0);
        env.board = board;
        env.current = current;
        env
    }

    #[test]
    fn mapping_lists_every_rotation_and_column() {
        let env = env_with(Board::EMPTY, PieceKind::T, false);
        let next = env.next_states();
        // T: two 3-wide rotations with 8 columns, two 2-wide with 9
        assert_eq!(next.len(), 8 + 9 + 8 + 9);
        assert!(next.actions().iter().all(|p| !p.hold));
        assert!(next.actions().is_sorted());
    }

    #[test]
    fn hold_doubles_the_candidates() {
        let env = env_with(Board::EMPTY, PieceKind::O, true);
        let hold_kind = env.pieces.peek_hold_result();
        let next = env.next_states();
        let plain = next.actions().iter().filter(|p| !p.hold).count();
        let held = next.actions().iter().filter(|p| p.hold).count();
        assert_eq!(plain, 9);
        let expected: usize = hold_kind
            .shapes()
            .iter()
            .map(|shape| Board::WIDTH - shape.width() + 1)
            .sum();
        assert_eq!(held, expected);
        assert!(next.actions().is_sorted());
    }

    #[test]
    fn completing_a_row_reports_the_clear() {
        let board = Board::from_ascii("######....");
        let mut env = env_with(board, PieceKind::I, false);
        let placement = Placement {
            hold: false,
            rotation: 0,
            column: 6,
        };
        assert_eq!(
            env.next_states().get(&placement),
            Some(&StateVector::from([1.0, 0.0, 0.0, 0.0]))
        );

        let step = env.step(&placement).unwrap();
        assert_eq!(step.cleared_lines, 1);
        assert_eq!(step.reward, 11.0);
        assert!(!step.done);
        assert_eq!(env.clears().get(1), 1);
        assert_eq!(*env.board(), Board::EMPTY);
    }

    #[test]
    fn columns_blocked_at_spawn_are_not_offered() {
        let rows = "#.........\n".repeat(Board::TOTAL_HEIGHT);
        let mut env = env_with(Board::from_ascii(&rows), PieceKind::O, false);
        let blocked = Placement {
            hold: false,
            rotation: 0,
            column: 0,
        };
        let next = env.next_states();
        assert!(!next.contains_action(&blocked));
        assert!(next.contains_action(&Placement {
            column: 1,
            ..blocked
        }));
        assert_eq!(
            env.step(&blocked),
            Err(IllegalPlacement::Blocked { column: 0 })
        );
    }

    #[test]
    fn lock_out_is_done_with_penalty() {
        let mut rows = "..........\n".repeat(2);
        rows.push_str(&"#.........\n".repeat(Board::VISIBLE_HEIGHT - 2));
        let mut env = env_with(Board::from_ascii(&rows), PieceKind::I, false);
        let placement = Placement {
            hold: false,
            rotation: 1,
            column: 0,
        };
        assert!(env.next_states().contains_action(&placement));

        let step = env.step(&placement).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, PLACEMENT_REWARD - GAME_OVER_PENALTY);
        assert!(env.is_game_over());
        assert!(env.next_states().is_empty());
        assert_eq!(env.step(&placement), Err(IllegalPlacement::GameOver));
    }

    #[test]
    fn foreign_placements_are_rejected() {
        let mut env = env_with(Board::EMPTY, PieceKind::O, false);
        let hold = Placement {
            hold: true,
            rotation: 0,
            column: 0,
        };
        assert_eq!(env.step(&hold), Err(IllegalPlacement::HoldDisabled));
        let rotated = Placement {
            hold: false,
            rotation: 1,
            column: 0,
        };
        assert!(matches!(
            env.step(&rotated),
            Err(IllegalPlacement::UnknownRotation { .. })
        ));
        let outside = Placement {
            hold: false,
            rotation: 0,
            column: 9,
        };
        assert!(matches!(
            env.step(&outside),
            Err(IllegalPlacement::OutOfBounds { .. })
        ));
        assert_eq!(env.placed_pieces(), 0);
    }

    #[test]
    fn hold_step_plays_the_hold_piece() {
        let mut env = env_with(Board::EMPTY, PieceKind::T, true);
        let incoming = env.pieces.peek_hold_result();
        let placement = Placement {
            hold: true,
            rotation: 0,
            column: 0,
        };
        env.step(&placement).unwrap();
        assert_eq!(env.held_piece(), Some(PieceKind::T));

        let shape = incoming.shape(0).unwrap();
        let mut expected = Board::EMPTY;
        let y = expected.drop_position(shape, 0).unwrap();
        expected.place(shape, 0, y);
        assert_eq!(*env.board(), expected);
    }
}
