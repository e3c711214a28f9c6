use std::num::NonZeroUsize;

use crate::{
    environment::Environment,
    policy::DecisionPolicy,
    record::EpisodeRecord,
    signal::{ControlSignal, SignalSource},
    state::StateVector,
};

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum TerminalReason {
    #[display("game over")]
    EngineDone,
    #[display("no legal moves")]
    NoLegalMoves,
    #[display("step budget exhausted")]
    StepBudgetExhausted,
    #[display("user requested exit")]
    UserExit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    pub record: EpisodeRecord,
    pub reason: TerminalReason,
}

/// The policy returned a state that is not among the candidates it was given.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("selected state {chosen:?} matches none of the {candidates} candidates")]
pub struct SelectionMismatch {
    pub candidates: usize,
    #[error(not(source))]
    pub chosen: StateVector,
}

/// Failure that aborts an episode.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EpisodeError<E> {
    #[display("policy selection could not be mapped to an action")]
    #[from]
    SelectionMismatch(SelectionMismatch),
    #[display("environment rejected the action")]
    Environment(E),
}

/// Runs the greedy decision loop for one episode at a time.
#[derive(Debug, Clone)]
pub struct EpisodeDriver {
    step_budget: NonZeroUsize,
    framerate: u32,
    progress_interval: Option<NonZeroUsize>,
}

impl EpisodeDriver {
    pub const DEFAULT_FRAMERATE: u32 = 10;
    pub const DEFAULT_PROGRESS_INTERVAL: NonZeroUsize = NonZeroUsize::new(500).unwrap();

    #[must_use]
    pub fn new(step_budget: NonZeroUsize) -> Self {
        Self {
            step_budget,
            framerate: Self::DEFAULT_FRAMERATE,
            progress_interval: Some(Self::DEFAULT_PROGRESS_INTERVAL),
        }
    }

    /// Frame rate passed to [`Environment::render`].
    #[must_use]
    pub fn framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate;
        self
    }

    /// Emits a progress event every `interval` steps; `None` disables it.
    #[must_use]
    pub fn progress_interval(mut self, interval: Option<NonZeroUsize>) -> Self {
        self.progress_interval = interval;
        self
    }

    #[must_use]
    pub fn step_budget(&self) -> NonZeroUsize {
        self.step_budget
    }

    /// Plays `env` with `policy` until a terminal condition.
    ///
    /// `env` is expected to be reset already. Signals are drained before each
    /// decision; a quit ends the episode before the step is counted.
    /// `done` reported on the step that also reaches the budget is reported as
    /// [`TerminalReason::EngineDone`].
    ///
    /// # Errors
    ///
    /// Returns [`EpisodeError::SelectionMismatch`] when the policy's choice
    /// matches no candidate (the environment is not stepped), and
    /// [`EpisodeError::Environment`] when the environment rejects an action.
    pub fn run_episode<E, P, S>(
        &self,
        env: &mut E,
        policy: &P,
        signals: &mut S,
    ) -> Result<EpisodeOutcome, EpisodeError<E::Error>>
    where
        E: Environment + ?Sized,
        P: DecisionPolicy + ?Sized,
        S: SignalSource + ?Sized,
    {
        let mut record = EpisodeRecord::new();

        let reason = loop {
            let mut quit = false;
            while let Some(signal) = signals.poll() {
                match signal {
                    ControlSignal::ToggleRender => env.toggle_render(),
                    ControlSignal::Quit => quit = true,
                }
            }
            if quit {
                break TerminalReason::UserExit;
            }

            if env.render_enabled() {
                env.render(record.total_reward, self.framerate);
            }

            let next = env.next_states();
            if next.is_empty() {
                break TerminalReason::NoLegalMoves;
            }

            let chosen = policy.select_best(next.states());
            let Some(action) = next.find_action(&chosen) else {
                return Err(SelectionMismatch {
                    candidates: next.len(),
                    chosen,
                }
                .into());
            };

            let step = env.step(action).map_err(EpisodeError::Environment)?;
            record.complete_step(&step);

            if self
                .progress_interval
                .is_some_and(|interval| record.steps % interval == 0)
            {
                tracing::info!(
                    steps = record.steps,
                    total_reward = record.total_reward,
                    "episode in progress"
                );
            }

            if step.done {
                break TerminalReason::EngineDone;
            }
            if record.steps >= self.step_budget.get() {
                break TerminalReason::StepBudgetExhausted;
            }
        };

        Ok(EpisodeOutcome { record, reason })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, convert::Infallible};

    use super::*;
    use crate::{NextStates, NoSignals, ScriptedSignals, Step};

    /// Offers two placements per step; the second one scores higher.
    #[derive(Default)]
    struct TwoLanes {
        steps: usize,
        render_enabled: bool,
        renders: usize,
    }

    impl Environment for TwoLanes {
        type Action = u8;
        type Error = Infallible;

        fn state_size(&self) -> usize {
            1
        }

        fn reset(&mut self) -> StateVector {
            self.steps = 0;
            StateVector::from([0.0])
        }

        fn next_states(&self) -> NextStates<u8> {
            [(0, StateVector::from([0.0])), (1, StateVector::from([1.0]))]
                .into_iter()
                .collect()
        }

        fn step(&mut self, action: &u8) -> Result<Step, Infallible> {
            self.steps += 1;
            Ok(Step {
                reward: f32::from(*action) + 1.0,
                done: false,
                cleared_lines: 0,
            })
        }

        fn render_enabled(&self) -> bool {
            self.render_enabled
        }

        fn toggle_render(&mut self) {
            self.render_enabled = !self.render_enabled;
        }

        fn render(&mut self, _total_reward: f32, _framerate: u32) {
            self.renders += 1;
        }
    }

    struct Greedy;

    impl DecisionPolicy for Greedy {
        fn select_best(&self, states: &[StateVector]) -> StateVector {
            let index = crate::argmax(states.iter().map(|s| s[0])).unwrap();
            states[index].clone()
        }
    }

    struct Counting<'a>(&'a Cell<usize>);

    impl DecisionPolicy for Counting<'_> {
        fn select_best(&self, states: &[StateVector]) -> StateVector {
            self.0.set(self.0.get() + 1);
            states[0].clone()
        }
    }

    fn budget(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn greedy_choice_drives_the_chosen_action() {
        let mut env = TwoLanes::default();
        let outcome = EpisodeDriver::new(budget(4))
            .run_episode(&mut env, &Greedy, &mut NoSignals)
            .unwrap();

        assert_eq!(outcome.reason, TerminalReason::StepBudgetExhausted);
        assert_eq!(outcome.record.steps, 4);
        assert_eq!(outcome.record.total_reward, 8.0);
    }

    #[test]
    fn quit_before_first_step_counts_nothing() {
        let mut env = TwoLanes::default();
        let calls = Cell::new(0);
        let mut signals = ScriptedSignals::new([vec![ControlSignal::Quit]]);

        let outcome = EpisodeDriver::new(budget(10))
            .run_episode(&mut env, &Counting(&calls), &mut signals)
            .unwrap();

        assert_eq!(outcome.reason, TerminalReason::UserExit);
        assert_eq!(outcome.record, EpisodeRecord::default());
        assert_eq!(calls.get(), 0);
        assert_eq!(env.steps, 0);
    }

    #[test]
    fn quit_mid_episode_keeps_completed_steps() {
        let mut env = TwoLanes::default();
        let mut signals = ScriptedSignals::new([vec![], vec![], vec![ControlSignal::Quit]]);

        let outcome = EpisodeDriver::new(budget(10))
            .run_episode(&mut env, &Greedy, &mut signals)
            .unwrap();

        assert_eq!(outcome.reason, TerminalReason::UserExit);
        assert_eq!(outcome.record.steps, 2);
    }

    #[test]
    fn progress_events_leave_the_outcome_untouched() {
        let driver = EpisodeDriver::new(budget(1200));
        let quiet = driver
            .clone()
            .progress_interval(None)
            .run_episode(&mut TwoLanes::default(), &Greedy, &mut NoSignals)
            .unwrap();
        for interval in [Some(budget(1)), Some(budget(7)), None] {
            let outcome = driver
                .clone()
                .progress_interval(interval)
                .run_episode(&mut TwoLanes::default(), &Greedy, &mut NoSignals)
                .unwrap();
            assert_eq!(outcome, quiet);
        }
        let outcome = driver
            .run_episode(&mut TwoLanes::default(), &Greedy, &mut NoSignals)
            .unwrap();
        assert_eq!(outcome, quiet);
        assert_eq!(quiet.record.steps, 1200);
        assert_eq!(quiet.reason, TerminalReason::StepBudgetExhausted);
    }

    #[test]
    fn episode_error_keeps_its_cause() {
        use std::error::Error as _;

        let mismatch = SelectionMismatch {
            candidates: 2,
            chosen: StateVector::from([9.0]),
        };
        let error = EpisodeError::<std::fmt::Error>::from(mismatch.clone());
        assert!(matches!(&error, EpisodeError::SelectionMismatch(m) if *m == mismatch));
        assert_eq!(
            error.to_string(),
            "policy selection could not be mapped to an action"
        );
        assert_eq!(
            error.source().map(ToString::to_string),
            Some(mismatch.to_string())
        );

        let error = EpisodeError::Environment(std::fmt::Error);
        assert_eq!(error.to_string(), "environment rejected the action");
        assert!(error.source().is_some());
    }

    #[test]
    fn render_toggle_applies_before_the_step_renders() {
        let mut env = TwoLanes::default();
        let mut signals = ScriptedSignals::new([
            vec![],
            vec![ControlSignal::ToggleRender],
            vec![],
            vec![ControlSignal::ToggleRender],
        ]);

        EpisodeDriver::new(budget(5))
            .run_episode(&mut env, &Greedy, &mut signals)
            .unwrap();

        assert!(!env.render_enabled);
        assert_eq!(env.renders, 2);
    }
}
