use crate::state::StateVector;

/// Chooses the most promising next state.
///
/// The driver hands over the candidate states in mapping order and expects one
/// of them back, unchanged. The returned vector is matched against the
/// candidates by exact equality; a vector that matches none of them aborts the
/// episode with [`SelectionMismatch`](crate::SelectionMismatch).
///
/// `states` is never empty.
pub trait DecisionPolicy {
    fn select_best(&self, states: &[StateVector]) -> StateVector;
}

impl<P> DecisionPolicy for &P
where
    P: DecisionPolicy + ?Sized,
{
    fn select_best(&self, states: &[StateVector]) -> StateVector {
        (**self).select_best(states)
    }
}

impl<P> DecisionPolicy for Box<P>
where
    P: DecisionPolicy + ?Sized,
{
    fn select_best(&self, states: &[StateVector]) -> StateVector {
        (**self).select_best(states)
    }
}

/// Index of the first strictly greatest score.
///
/// Later candidates replace the current best only when they score higher, so
/// ties resolve to the earliest candidate. Returns `None` for no scores.
///
/// ```
/// use tetrabot_harness::argmax;
///
/// assert_eq!(argmax([1.0, 3.0, 3.0, 2.0]), Some(1));
/// assert_eq!(argmax(std::iter::empty()), None);
/// ```
pub fn argmax<I>(scores: I) -> Option<usize>
where
    I: IntoIterator<Item = f32>,
{
    let mut best: Option<(usize, f32)> = None;
    for (index, score) in scores.into_iter().enumerate() {
        match best {
            Some((_, best_score)) if score <= best_score || score.is_nan() => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}
