use tetrabot_harness::{DecisionPolicy, StateVector};

use crate::{evolved::EvolvedNetwork, value_network::ValueNetwork};

/// The policy a run plays with, picked once at configuration time.
#[derive(Debug, Clone, derive_more::From, derive_more::IsVariant)]
pub enum Policy {
    Value(ValueNetwork),
    Evolved(EvolvedNetwork),
}

impl Policy {
    /// Input width the policy expects.
    #[must_use]
    pub fn state_size(&self) -> usize {
        match self {
            Self::Value(network) => network.state_size(),
            Self::Evolved(network) => network.num_inputs(),
        }
    }

    #[must_use]
    pub fn score(&self, state: &[f32]) -> f32 {
        match self {
            Self::Value(network) => network.score(state),
            Self::Evolved(network) => network.score(state),
        }
    }
}

impl DecisionPolicy for Policy {
    fn select_best(&self, states: &[StateVector]) -> StateVector {
        match self {
            Self::Value(network) => network.select_best(states),
            Self::Evolved(network) => network.select_best(states),
        }
    }
}
