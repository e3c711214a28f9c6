//! Reproduction between generations.
//!
//! [`WeightEvolver`] is a plain genetic algorithm over the parameter vector of
//! a fixed-topology network:
//!
//! 1. **Elitism** - the `elite_count` fittest genomes are carried over as-is
//! 2. **Tournament selection** - each parent is the fittest of
//!    `tournament_size` genomes drawn without replacement
//! 3. **BLX-α crossover** - see [`params::blx_alpha`]
//! 4. **Gaussian mutation** - see [`params::mutate`]
//!
//! Genomes that were never evaluated rank below every evaluated one.

use std::cmp::Ordering;

use rand::{Rng, seq::index};
use rand_distr::Normal;
use rand_pcg::Pcg32;

use crate::{
    config::{ConfigError, EvolutionConfig},
    genome::Genome,
    params,
    population::Population,
};

/// Produces the next generation from an evaluated one.
pub trait Evolver {
    fn evolve(&mut self, population: &Population) -> Population;
}

impl<V> Evolver for &mut V
where
    V: Evolver + ?Sized,
{
    fn evolve(&mut self, population: &Population) -> Population {
        (**self).evolve(population)
    }
}

#[derive(Debug, Clone)]
pub struct WeightEvolver<R = Pcg32> {
    elite_count: usize,
    tournament_size: usize,
    blx_alpha: f32,
    mutation_rate: f64,
    mutation: Normal<f32>,
    weight_bound: f32,
    rng: R,
}

impl<R> WeightEvolver<R>
where
    R: Rng,
{
    pub fn new(config: &EvolutionConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let mutation = Normal::new(0.0, config.mutation_sigma).map_err(|_| ConfigError {
            field: "mutation_sigma",
            reason: "must be a non-negative number",
        })?;
        Ok(Self {
            elite_count: config.elite_count,
            tournament_size: config.tournament_size,
            blx_alpha: config.blx_alpha,
            mutation_rate: config.mutation_rate.into(),
            mutation,
            weight_bound: config.weight_bound,
            rng,
        })
    }
}

impl<R> Evolver for WeightEvolver<R>
where
    R: Rng,
{
    fn evolve(&mut self, population: &Population) -> Population {
        let mut ranked: Vec<&Genome> = population.genomes().iter().collect();
        ranked.sort_by(|a, b| by_fitness_desc(a, b));

        let mut next = population.successor();
        for elite in ranked.iter().take(self.elite_count) {
            next.carry_over(elite);
        }
        while next.len() < ranked.len() {
            let p1 = self.tournament_select(&ranked);
            let p2 = self.tournament_select(&ranked);

            let mut child = params::blx_alpha(
                &p1.network().parameters(),
                &p2.network().parameters(),
                self.blx_alpha,
                self.weight_bound,
                &mut self.rng,
            );
            params::mutate(
                &mut child,
                &self.mutation,
                self.mutation_rate,
                self.weight_bound,
                &mut self.rng,
            );

            let mut network = p1.network().clone();
            network.set_parameters(&child);
            next.push(network);
        }
        next
    }
}

impl<R> WeightEvolver<R>
where
    R: Rng,
{
    /// `ranked` is sorted best first, so the smallest drawn index wins.
    fn tournament_select<'a>(&mut self, ranked: &[&'a Genome]) -> &'a Genome {
        let amount = self.tournament_size.min(ranked.len());
        let winner = index::sample(&mut self.rng, ranked.len(), amount)
            .into_iter()
            .min()
            .unwrap_or(0);
        ranked[winner]
    }
}

fn by_fitness_desc(a: &Genome, b: &Genome) -> Ordering {
    let key = |g: &Genome| g.fitness().unwrap_or(f32::NEG_INFINITY);
    key(b).total_cmp(&key(a))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;

    use super::*;
    use crate::genome::GenomeId;

    fn config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 6,
            hidden_nodes: 2,
            elite_count: 2,
            tournament_size: 3,
            weight_bound: 1.0,
            ..EvolutionConfig::default()
        }
    }

    fn evaluated(fitness: &[f32]) -> Population {
        let mut rng = Pcg32::seed_from_u64(11);
        let population = Population::random(&config(), 4, &mut rng);
        let genomes = population
            .genomes()
            .iter()
            .zip(fitness)
            .map(|(genome, &f)| {
                let mut genome = genome.clone();
                genome.assign_fitness(f);
                genome
            })
            .collect();
        Population::from_genomes(3, genomes)
    }

    #[test]
    fn elites_survive_and_children_get_fresh_ids() {
        let population = evaluated(&[1.0, 9.0, 3.0, 7.0, 2.0, 5.0]);
        let mut evolver = WeightEvolver::new(&config(), Pcg32::seed_from_u64(5)).unwrap();
        let next = evolver.evolve(&population);

        assert_eq!(next.generation(), 4);
        assert_eq!(next.len(), 6);
        assert_eq!(next.genomes()[0].id(), GenomeId(1));
        assert_eq!(next.genomes()[1].id(), GenomeId(3));
        assert_eq!(
            next.genomes()[0].network(),
            population.genomes()[1].network()
        );
        assert!(next.genomes().iter().all(|g| g.fitness().is_none()));
        assert!(next.genomes()[2..].iter().all(|g| g.id().0 >= 6));
        for genome in next.genomes() {
            assert!(genome.network().parameters().iter().all(|p| p.abs() <= 1.0));
        }
    }

    #[test]
    fn same_seed_evolves_identically() {
        let population = evaluated(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let evolve = || {
            WeightEvolver::new(&config(), Pcg32::seed_from_u64(9))
                .unwrap()
                .evolve(&population)
        };
        assert_eq!(evolve(), evolve());
    }

    #[test]
    fn full_tournament_always_picks_the_best() {
        let config = EvolutionConfig {
            tournament_size: 6,
            elite_count: 0,
            blx_alpha: 0.0,
            mutation_rate: 0.0,
            ..config()
        };
        let population = evaluated(&[1.0, 2.0, 8.0, 4.0, 5.0, 6.0]);
        let mut evolver = WeightEvolver::new(&config, Pcg32::seed_from_u64(1)).unwrap();
        let next = evolver.evolve(&population);
        for genome in next.genomes() {
            assert_eq!(genome.network(), population.genomes()[2].network());
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EvolutionConfig {
            tournament_size: 0,
            ..config()
        };
        assert!(WeightEvolver::new(&config, Pcg32::seed_from_u64(0)).is_err());
    }
}
