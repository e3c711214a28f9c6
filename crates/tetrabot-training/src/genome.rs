use serde::{Deserialize, Serialize};
use tetrabot_policy::NetworkGenome;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct GenomeId(pub u64);

/// One candidate network together with the fitness of its last evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    id: GenomeId,
    network: NetworkGenome,
    fitness: Option<f32>,
}

impl Genome {
    #[must_use]
    pub fn new(id: GenomeId, network: NetworkGenome) -> Self {
        Self {
            id,
            network,
            fitness: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> GenomeId {
        self.id
    }

    #[must_use]
    pub fn network(&self) -> &NetworkGenome {
        &self.network
    }

    /// `None` until the genome has been evaluated.
    #[must_use]
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    /// Records the result of this genome's evaluation.
    ///
    /// # Panics
    ///
    /// Panics if a fitness was already assigned.
    pub fn assign_fitness(&mut self, fitness: f32) {
        assert!(
            self.fitness.is_none(),
            "genome {} was evaluated twice",
            self.id
        );
        self.fitness = Some(fitness);
    }

    /// Same genes under a possibly new id, not yet evaluated.
    #[must_use]
    pub(crate) fn unevaluated(&self, id: GenomeId) -> Self {
        Self::new(id, self.network.clone())
    }
}

#[cfg(test)]
mod tests {
    use tetrabot_policy::NodeActivation;

    use super::*;

    #[test]
    #[should_panic(expected = "evaluated twice")]
    fn fitness_is_assigned_once() {
        let mut genome = Genome::new(
            GenomeId(3),
            NetworkGenome::layered(2, 1, NodeActivation::Sigmoid),
        );
        genome.assign_fitness(1.0);
        assert_eq!(genome.fitness(), Some(1.0));
        genome.assign_fitness(2.0);
    }
}
