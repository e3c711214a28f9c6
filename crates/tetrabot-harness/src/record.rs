use crate::environment::Step;

/// Count of multi-line clears by size.
///
/// Index `n - 1` holds the number of times exactly `n` rows were cleared at once.
///
/// ```
/// use tetrabot_harness::ClearCounts;
///
/// let mut clears = ClearCounts::default();
/// clears.record(4);
/// clears.record(1);
/// clears.record(0); // no clear, not counted
///
/// assert_eq!(clears.as_array(), [1, 0, 0, 1]);
/// assert_eq!(clears.tetrises(), 1);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearCounts {
    counts: [usize; 4],
}

impl ClearCounts {
    /// Records a clear of `lines` rows. Zero-row drops are ignored.
    pub fn record(&mut self, lines: usize) {
        if let Some(count) = lines
            .checked_sub(1)
            .and_then(|index| self.counts.get_mut(index))
        {
            *count += 1;
        }
    }

    /// Number of clears of exactly `lines` rows (1-4).
    #[must_use]
    pub fn get(&self, lines: usize) -> usize {
        lines
            .checked_sub(1)
            .and_then(|index| self.counts.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Number of 4-row clears.
    #[must_use]
    pub fn tetrises(&self) -> usize {
        self.counts[3]
    }

    #[must_use]
    pub fn as_array(&self) -> [usize; 4] {
        self.counts
    }
}

/// Bookkeeping for a single episode.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub total_reward: f32,
    pub steps: usize,
    pub clears: ClearCounts,
}

impl EpisodeRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete_step(&mut self, step: &Step) {
        self.total_reward += step.reward;
        self.steps += 1;
        self.clears.record(step.cleared_lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_step_accumulates_reward_steps_and_clears() {
        let mut record = EpisodeRecord::new();
        for (reward, lines) in [(1.0, 0), (11.0, 1), (161.0, 4), (-1.0, 0)] {
            record.complete_step(&Step {
                reward,
                done: false,
                cleared_lines: lines,
            });
        }

        assert_eq!(record.total_reward, 172.0);
        assert_eq!(record.steps, 4);
        assert_eq!(record.clears.get(1), 1);
        assert_eq!(record.clears.get(4), 1);
        assert_eq!(record.clears.get(0), 0);
        assert_eq!(record.clears.get(5), 0);
    }

    #[test]
    fn oversized_clears_are_ignored() {
        let mut clears = ClearCounts::default();
        clears.record(7);
        assert_eq!(clears, ClearCounts::default());
    }
}
