use std::{error::Error, fmt, hash::Hash};

use crate::state::{NextStates, StateVector};

/// Result of applying one action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Reward earned by the action.
    pub reward: f32,
    /// Whether the game ended as a consequence of the action.
    pub done: bool,
    /// Number of rows removed by the action (0-4).
    pub cleared_lines: usize,
}

/// A game the episode driver can play.
///
/// Implementations enumerate every legal action from the current configuration
/// together with the state it leads to, and apply actions chosen from that
/// mapping. The render methods default to a headless environment.
pub trait Environment {
    /// Identifies one legal placement. Only the environment creates these.
    type Action: Clone + Eq + Hash + fmt::Debug;
    /// Failure applying an action.
    type Error: Error + Send + Sync + 'static;

    /// Length of every [`StateVector`] this environment produces.
    fn state_size(&self) -> usize;

    /// Starts a new game and returns the state of the empty configuration.
    fn reset(&mut self) -> StateVector;

    /// Returns every action reachable from the current configuration.
    ///
    /// An empty mapping means no legal move remains.
    fn next_states(&self) -> NextStates<Self::Action>;

    /// Applies `action`, which must come from the latest [`Self::next_states`] call.
    fn step(&mut self, action: &Self::Action) -> Result<Step, Self::Error>;

    fn render_enabled(&self) -> bool {
        false
    }

    fn toggle_render(&mut self) {}

    /// Draws the current configuration, paced to `framerate` frames per second.
    ///
    /// Rendering is best effort; implementations report failures through logs.
    fn render(&mut self, _total_reward: f32, _framerate: u32) {}
}

/// Environments whose randomness is driven by an explicit seed.
///
/// Runs bump the seed between episodes so that each episode sees a different,
/// reproducible piece sequence.
pub trait Reseed {
    fn seed(&self) -> u64;

    /// Takes effect at the next [`Environment::reset`].
    fn set_seed(&mut self, seed: u64);
}

impl<E> Environment for &mut E
where
    E: Environment + ?Sized,
{
    type Action = E::Action;
    type Error = E::Error;

    fn state_size(&self) -> usize {
        (**self).state_size()
    }

    fn reset(&mut self) -> StateVector {
        (**self).reset()
    }

    fn next_states(&self) -> NextStates<Self::Action> {
        (**self).next_states()
    }

    fn step(&mut self, action: &Self::Action) -> Result<Step, Self::Error> {
        (**self).step(action)
    }

    fn render_enabled(&self) -> bool {
        (**self).render_enabled()
    }

    fn toggle_render(&mut self) {
        (**self).toggle_render();
    }

    fn render(&mut self, total_reward: f32, framerate: u32) {
        (**self).render(total_reward, framerate);
    }
}

impl<E> Reseed for &mut E
where
    E: Reseed + ?Sized,
{
    fn seed(&self) -> u64 {
        (**self).seed()
    }

    fn set_seed(&mut self, seed: u64) {
        (**self).set_seed(seed);
    }
}
