//! Episode harness for agents that play Tetris by picking among candidate placements.
//!
//! The harness owns the greedy decision loop and the bookkeeping around it. The
//! game itself, the scoring networks and the metric backends are collaborators
//! reached through the traits defined here:
//!
//! - [`Environment`] - produces the [`NextStates`] mapping and applies actions
//! - [`DecisionPolicy`] - picks the best [`StateVector`] among the candidates
//! - [`SignalSource`] - side channel for render toggles and quit requests
//! - [`TelemetrySink`] - receives per-episode metrics and log rows
//!
//! # Decision Loop
//!
//! ```text
//! EpisodeDriver
//!     ↓ next_states()
//! Environment ── NextStates { action → state }
//!     ↓ states
//! DecisionPolicy ── select_best() → chosen state
//!     ↓ exact match, first in mapping order
//! Environment ── step(action) → Step { reward, done, cleared_lines }
//! ```
//!
//! [`EpisodeDriver::run_episode`] repeats this until the environment reports
//! `done`, the mapping comes back empty, the step budget is spent, or a quit
//! signal arrives. Exactly one [`TerminalReason`] is reported per episode.
//!
//! Across episodes, [`RunContext`] keeps the run-level state (reward history,
//! highscore, telemetry sinks) and is closed explicitly at the end of a run.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//!
//! use tetrabot_harness::{
//!     DecisionPolicy, EpisodeDriver, Environment, NextStates, NoSignals, StateVector, Step,
//!     TerminalReason,
//! };
//!
//! /// Counts down; every step offers a single action.
//! struct Countdown(u32);
//!
//! impl Environment for Countdown {
//!     type Action = u32;
//!     type Error = std::convert::Infallible;
//!
//!     fn state_size(&self) -> usize {
//!         1
//!     }
//!
//!     fn reset(&mut self) -> StateVector {
//!         StateVector::from([self.0 as f32])
//!     }
//!
//!     fn next_states(&self) -> NextStates<u32> {
//!         let mut states = NextStates::new();
//!         states.push(self.0, StateVector::from([self.0 as f32]));
//!         states
//!     }
//!
//!     fn step(&mut self, _action: &u32) -> Result<Step, Self::Error> {
//!         self.0 -= 1;
//!         Ok(Step { reward: 1.0, done: self.0 == 0, cleared_lines: 0 })
//!     }
//! }
//!
//! struct First;
//!
//! impl DecisionPolicy for First {
//!     fn select_best(&self, states: &[StateVector]) -> StateVector {
//!         states[0].clone()
//!     }
//! }
//!
//! let driver = EpisodeDriver::new(NonZeroUsize::new(100).unwrap());
//! let outcome = driver.run_episode(&mut Countdown(3), &First, &mut NoSignals).unwrap();
//! assert_eq!(outcome.reason, TerminalReason::EngineDone);
//! assert_eq!(outcome.record.steps, 3);
//! assert_eq!(outcome.record.total_reward, 3.0);
//! ```

pub use self::{
    driver::*, environment::*, policy::*, record::*, run::*, signal::*, state::*, stats::*,
    telemetry::*,
};

mod driver;
mod environment;
mod policy;
mod record;
mod run;
mod signal;
mod state;
mod stats;
mod telemetry;
