use std::ops::ControlFlow;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tetrabot_harness::{EpisodeDriver, Environment, Reseed, SignalSource, SummaryStats};
use tetrabot_policy::{EvolvedNetwork, NetworkGenome};

use crate::{
    config::EvolutionConfig,
    error::TrainingError,
    genome::{Genome, GenomeId},
    params,
};

/// The genomes of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    generation: usize,
    next_id: u64,
    genomes: Vec<Genome>,
}

impl Population {
    /// Generation 0: `config.population_size` single-hidden-layer networks for
    /// `num_inputs`-wide states with uniformly random parameters.
    pub fn random<R>(config: &EvolutionConfig, num_inputs: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let template = NetworkGenome::layered(num_inputs, config.hidden_nodes, config.activation);
        let mut population = Self {
            generation: 0,
            next_id: 0,
            genomes: Vec::with_capacity(config.population_size),
        };
        for _ in 0..config.population_size {
            let mut network = template.clone();
            network.set_parameters(&params::random(
                rng,
                config.weight_bound,
                template.parameter_count(),
            ));
            population.push(network);
        }
        population
    }

    /// Wraps existing genomes; new ids continue after the largest one in use.
    #[must_use]
    pub fn from_genomes(generation: usize, genomes: Vec<Genome>) -> Self {
        let next_id = genomes.iter().map(|g| g.id().0 + 1).max().unwrap_or(0);
        Self {
            generation,
            next_id,
            genomes,
        }
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Best evaluated genome; the earliest one wins a tie.
    #[must_use]
    pub fn best(&self) -> Option<&Genome> {
        self.genomes
            .iter()
            .filter(|g| g.fitness().is_some())
            .fold(None, |best: Option<&Genome>, g| match best {
                Some(b) if b.fitness() >= g.fitness() => Some(b),
                _ => Some(g),
            })
    }

    /// Fitness spread over the evaluated genomes.
    #[must_use]
    pub fn fitness_stats(&self) -> Option<SummaryStats> {
        SummaryStats::new(self.genomes.iter().filter_map(Genome::fitness))
    }

    /// Empty population for the following generation, sharing the id counter.
    #[must_use]
    pub fn successor(&self) -> Self {
        Self {
            generation: self.generation + 1,
            next_id: self.next_id,
            genomes: Vec::with_capacity(self.genomes.len()),
        }
    }

    /// Adds a new genome under a fresh id.
    pub fn push(&mut self, network: NetworkGenome) -> GenomeId {
        let id = GenomeId(self.next_id);
        self.next_id += 1;
        self.genomes.push(Genome::new(id, network));
        id
    }

    /// Carries `genome` over unchanged, keeping its id but not its fitness.
    pub fn carry_over(&mut self, genome: &Genome) {
        self.genomes.push(genome.unevaluated(genome.id()));
    }

    /// Plays one episode per genome, in order, and assigns the episode's total
    /// reward as the genome's fitness.
    ///
    /// Every episode starts from `env` reset with `seed`, so all genomes of
    /// the generation face the same piece sequence. A quit signal stops the
    /// evaluation with [`ControlFlow::Break`]; the interrupted genome keeps
    /// no fitness.
    ///
    /// # Errors
    ///
    /// Fails when a genome does not decode into a network or when an episode
    /// fails.
    pub fn evaluate<E, S>(
        &mut self,
        env: &mut E,
        driver: &EpisodeDriver,
        signals: &mut S,
        seed: u64,
    ) -> Result<ControlFlow<()>, TrainingError<E::Error>>
    where
        E: Environment + Reseed + ?Sized,
        S: SignalSource + ?Sized,
    {
        for genome in &mut self.genomes {
            if genome.fitness().is_some() {
                continue;
            }
            let network = EvolvedNetwork::from_genome(genome.network())
                .map_err(|source| TrainingError::Network {
                    id: genome.id(),
                    source,
                })?;
            env.set_seed(seed);
            env.reset();
            let outcome = driver.run_episode(env, &network, signals)?;
            if outcome.reason.is_user_exit() {
                return Ok(ControlFlow::Break(()));
            }
            tracing::debug!(
                generation = self.generation,
                genome = %genome.id(),
                fitness = outcome.record.total_reward,
                steps = outcome.record.steps,
                reason = %outcome.reason,
                "genome evaluated"
            );
            genome.assign_fitness(outcome.record.total_reward);
        }
        Ok(ControlFlow::Continue(()))
    }
}
