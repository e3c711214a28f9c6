use std::collections::VecDeque;

use rand::{SeedableRng as _, seq::SliceRandom};
use rand_pcg::Pcg32;

use crate::PieceKind;

/// Piece supply using the 7-bag randomizer, plus the hold slot.
///
/// Each bag holds the seven pieces once in shuffled order, so no piece is
/// ever absent for more than twelve draws. The shuffle is driven by a
/// [`Pcg32`] seeded from a `u64`; equal seeds give equal sequences.
///
/// ```
/// use tetrabot_engine::PieceBuffer;
///
/// let mut a = PieceBuffer::with_seed(7);
/// let mut b = PieceBuffer::with_seed(7);
/// let first: Vec<_> = (0..14).map(|_| a.pop_next()).collect();
/// let second: Vec<_> = (0..14).map(|_| b.pop_next()).collect();
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone)]
pub struct PieceBuffer {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
    held: Option<PieceKind>,
}

impl PieceBuffer {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let mut this = Self {
            rng: Pcg32::seed_from_u64(seed),
            bag: VecDeque::with_capacity(PieceKind::LEN * 2),
            held: None,
        };
        this.fill_bag();
        this
    }

    /// Keeps more than one full bag queued so the hold preview is always known.
    fn fill_bag(&mut self) {
        while self.bag.len() <= PieceKind::LEN {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.bag.extend(new_bag);
        }
    }

    pub fn pop_next(&mut self) -> PieceKind {
        let next = self.peek_next();
        self.bag.pop_front();
        self.fill_bag();
        next
    }

    /// The piece [`Self::pop_next`] returns next.
    #[must_use]
    pub fn peek_next(&self) -> PieceKind {
        self.bag[0]
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.iter().copied()
    }

    /// Piece that holding would bring into play: the held piece, or the next
    /// one in the queue when the slot is empty.
    #[must_use]
    pub fn peek_hold_result(&self) -> PieceKind {
        self.held.unwrap_or_else(|| self.peek_next())
    }

    /// Stores `current` in the hold slot and returns the piece to play instead.
    pub fn hold(&mut self, current: PieceKind) -> PieceKind {
        self.held
            .replace(current)
            .unwrap_or_else(|| self.pop_next())
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.held
    }
}
