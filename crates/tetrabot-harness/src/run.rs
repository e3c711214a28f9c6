use std::{
    num::NonZeroUsize,
    ops::ControlFlow,
    time::{Duration, Instant},
};

use crate::{
    driver::{EpisodeDriver, EpisodeError, EpisodeOutcome},
    environment::{Environment, Reseed},
    policy::DecisionPolicy,
    signal::SignalSource,
    stats::SummaryStats,
    telemetry::Telemetry,
};

/// Run-level state shared by consecutive episodes.
///
/// Created at the start of a run, updated after every episode with
/// [`Self::finish_episode`] and consumed by [`Self::close`], which flushes the
/// sinks and produces the final summary.
#[derive(Debug)]
pub struct RunContext {
    telemetry: Telemetry,
    print_interval: NonZeroUsize,
    rewards: Vec<f32>,
    tetrises: Vec<usize>,
    highscore: f32,
}

impl RunContext {
    #[must_use]
    pub fn new(telemetry: Telemetry, print_interval: NonZeroUsize) -> Self {
        Self {
            telemetry,
            print_interval,
            rewards: vec![],
            tetrises: vec![],
            highscore: 0.0,
        }
    }

    /// Total rewards of the kept episodes, in order.
    #[must_use]
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    #[must_use]
    pub fn highscore(&self) -> f32 {
        self.highscore
    }

    /// Books a finished episode.
    ///
    /// Metrics are recorded first. An episode that ended by user request stops
    /// the run right there; it is neither kept in the history nor written to
    /// the episode log.
    pub fn finish_episode(
        &mut self,
        episode: usize,
        outcome: &EpisodeOutcome,
        elapsed: Duration,
    ) -> ControlFlow<()> {
        let record = &outcome.record;
        self.telemetry.record_metrics(episode, record);
        if outcome.reason.is_user_exit() {
            return ControlFlow::Break(());
        }

        self.rewards.push(record.total_reward);
        self.tetrises.push(record.clears.tetrises());
        self.highscore = self.highscore.max(record.total_reward);

        if self.summary_due(episode) {
            let interval = self.print_interval.get().min(self.rewards.len());
            let recent = &self.rewards[self.rewards.len() - interval..];
            let recent_tetrises = &self.tetrises[self.tetrises.len() - interval..];
            let stats = SummaryStats::new(recent.iter().copied());
            tracing::info!(
                episode,
                reason = %outcome.reason,
                steps = record.steps,
                mean_reward = stats.map_or(0.0, |s| s.mean),
                round_highscore = stats.map_or(0.0, |s| s.max),
                highscore = self.highscore,
                round_tetris_highscore = recent_tetrises.iter().copied().max().unwrap_or(0),
                tetris_highscore = self.tetrises.iter().copied().max().unwrap_or(0),
                elapsed_secs = elapsed.as_secs_f64(),
                "episode finished"
            );
        }

        self.telemetry.append_episode(record);
        ControlFlow::Continue(())
    }

    /// Summaries cover the first episode and then every `print_interval`-th.
    fn summary_due(&self, episode: usize) -> bool {
        episode % self.print_interval == 0
    }

    /// Flushes the sinks and summarizes the run.
    #[must_use]
    pub fn close(mut self) -> RunSummary {
        self.telemetry.flush();
        RunSummary {
            episodes: self.rewards.len(),
            last_reward: self.rewards.last().copied(),
            rewards: SummaryStats::new(self.rewards.iter().copied()),
            highscore: self.highscore,
            tetris_highscore: self.tetrises.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Final figures of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of kept episodes.
    pub episodes: usize,
    pub last_reward: Option<f32>,
    /// `None` when no episode was kept.
    pub rewards: Option<SummaryStats>,
    pub highscore: f32,
    pub tetris_highscore: usize,
}

impl RunSummary {
    pub fn log(&self) {
        tracing::info!(
            episodes = self.episodes,
            final_score = self.last_reward.unwrap_or(0.0),
            mean_reward = self.rewards.map_or(0.0, |s| s.mean),
            std_reward = self.rewards.map_or(0.0, |s| s.std_dev),
            highscore = self.highscore,
            tetris_highscore = self.tetris_highscore,
            "run finished"
        );
    }
}

/// Plays consecutive episodes with one policy, bumping the seed in between.
#[derive(Debug, Clone)]
pub struct EvaluationLoop {
    max_episodes: usize,
    driver: EpisodeDriver,
}

impl EvaluationLoop {
    #[must_use]
    pub fn new(max_episodes: usize, driver: EpisodeDriver) -> Self {
        Self {
            max_episodes,
            driver,
        }
    }

    /// Runs up to `max_episodes` episodes, booking each in `ctx`.
    ///
    /// Returns the number of episodes played, including one ended by a quit.
    ///
    /// # Errors
    ///
    /// Propagates the first [`EpisodeError`]; the episodes already booked stay
    /// in `ctx`.
    pub fn run<E, P, S>(
        &self,
        env: &mut E,
        policy: &P,
        signals: &mut S,
        ctx: &mut RunContext,
    ) -> Result<usize, EpisodeError<E::Error>>
    where
        E: Environment + Reseed + ?Sized,
        P: DecisionPolicy + ?Sized,
        S: SignalSource + ?Sized,
    {
        for episode in 0..self.max_episodes {
            env.reset();
            let start = Instant::now();
            let outcome = self.driver.run_episode(env, policy, signals)?;
            if ctx
                .finish_episode(episode, &outcome, start.elapsed())
                .is_break()
            {
                return Ok(episode + 1);
            }
            env.set_seed(env.seed().wrapping_add(1));
        }
        Ok(self.max_episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EpisodeRecord, Step, TerminalReason};

    fn outcome(reward: f32, tetrises: usize, reason: TerminalReason) -> EpisodeOutcome {
        let mut record = EpisodeRecord::new();
        record.complete_step(&Step {
            reward,
            done: false,
            cleared_lines: 0,
        });
        for _ in 0..tetrises {
            record.complete_step(&Step {
                reward: 0.0,
                done: false,
                cleared_lines: 4,
            });
        }
        EpisodeOutcome { record, reason }
    }

    #[test]
    fn user_exit_is_not_kept() {
        let mut ctx = RunContext::new(Telemetry::new(), NonZeroUsize::MIN);
        let flow = ctx.finish_episode(
            0,
            &outcome(10.0, 0, TerminalReason::EngineDone),
            Duration::ZERO,
        );
        assert!(flow.is_continue());
        let flow = ctx.finish_episode(
            1,
            &outcome(99.0, 3, TerminalReason::UserExit),
            Duration::ZERO,
        );
        assert!(flow.is_break());

        let summary = ctx.close();
        assert_eq!(summary.episodes, 1);
        assert_eq!(summary.highscore, 10.0);
        assert_eq!(summary.tetris_highscore, 0);
    }

    #[test]
    fn summary_reports_population_spread() {
        let mut ctx = RunContext::new(Telemetry::new(), NonZeroUsize::new(2).unwrap());
        let episodes = [(2.0, 1), (4.0, 0), (6.0, 2)];
        for (episode, (reward, tetrises)) in episodes.into_iter().enumerate() {
            let _ = ctx.finish_episode(
                episode,
                &outcome(reward, tetrises, TerminalReason::NoLegalMoves),
                Duration::ZERO,
            );
        }

        let summary = ctx.close();
        assert_eq!(summary.episodes, 3);
        assert_eq!(summary.last_reward, Some(6.0));
        assert_eq!(summary.highscore, 6.0);
        assert_eq!(summary.tetris_highscore, 2);
        let rewards = summary.rewards.unwrap();
        assert_eq!(rewards.mean, 4.0);
        assert!((rewards.std_dev - (8.0_f32 / 3.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn summaries_start_with_the_first_episode() {
        let ctx = RunContext::new(Telemetry::new(), NonZeroUsize::new(3).unwrap());
        let due = (0..7)
            .filter(|&episode| ctx.summary_due(episode))
            .collect::<Vec<_>>();
        assert_eq!(due, [0, 3, 6]);

        let every = RunContext::new(Telemetry::new(), NonZeroUsize::MIN);
        assert!((0..4).all(|episode| every.summary_due(episode)));
    }

    #[test]
    fn empty_run_has_no_reward_stats() {
        let summary = RunContext::new(Telemetry::new(), NonZeroUsize::MIN).close();
        assert_eq!(summary.episodes, 0);
        assert_eq!(summary.last_reward, None);
        assert_eq!(summary.rewards, None);
    }
}
