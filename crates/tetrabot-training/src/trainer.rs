use std::{num::NonZeroUsize, time::Instant};

use chrono::Utc;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use tetrabot_harness::{EpisodeDriver, Environment, Reseed, SignalSource};

use crate::{
    checkpoint::{Checkpoint, Checkpointer},
    config::{ConfigError, EvolutionConfig},
    error::TrainingError,
    evolver::{Evolver, WeightEvolver},
    genome::Genome,
    population::Population,
    reporter::{GenerationReport, Reporter, StatisticsReporter},
};

/// Why a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum TrainingStop {
    #[display("generation limit reached")]
    GenerationLimit,
    #[display("fitness threshold reached")]
    FitnessThreshold,
    #[display("user requested exit")]
    UserExit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub stop: TrainingStop,
    /// Generations evaluated in full during this run.
    pub generations: usize,
    /// Best genome over all evaluated generations, including earlier runs
    /// of a restored checkpoint.
    pub best: Option<Genome>,
}

/// Drives the evaluate / report / reproduce cycle.
pub struct Trainer<V = WeightEvolver> {
    config: EvolutionConfig,
    population: Population,
    evolver: V,
    driver: EpisodeDriver,
    checkpointer: Option<Checkpointer>,
    reporters: Vec<Box<dyn Reporter>>,
    statistics: StatisticsReporter,
    best: Option<Genome>,
}

impl<V> std::fmt::Debug for Trainer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("generation", &self.population.generation())
            .field("population", &self.population.len())
            .field("reporters", &self.reporters.len())
            .finish_non_exhaustive()
    }
}

impl Trainer {
    /// Starts from a random population for `num_inputs`-wide states.
    ///
    /// The population and the evolver draw from one generator seeded with
    /// `config.seed`, so equal configurations train identically.
    pub fn new(config: EvolutionConfig, num_inputs: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let population = Population::random(&config, num_inputs, &mut rng);
        let evolver = WeightEvolver::new(&config, rng)?;
        Ok(Self::with_parts(config, population, evolver, None, vec![]))
    }

    /// Resumes from `checkpoint` with the configuration stored in it.
    pub fn restore(checkpoint: Checkpoint) -> Result<Self, ConfigError> {
        let Checkpoint {
            config,
            population,
            best,
            history,
            ..
        } = checkpoint;
        config.validate()?;
        let rng = Pcg32::seed_from_u64(config.seed.wrapping_add(population.generation() as u64));
        let evolver = WeightEvolver::new(&config, rng)?;
        tracing::info!(
            generation = population.generation(),
            genomes = population.len(),
            "restored training state"
        );
        Ok(Self::with_parts(config, population, evolver, best, history))
    }
}

impl<V> Trainer<V>
where
    V: Evolver,
{
    fn with_parts(
        config: EvolutionConfig,
        population: Population,
        evolver: V,
        best: Option<Genome>,
        history: Vec<GenerationReport>,
    ) -> Self {
        let step_budget = NonZeroUsize::new(config.step_budget).unwrap_or(NonZeroUsize::MIN);
        Self {
            checkpointer: Checkpointer::from_config(&config),
            driver: EpisodeDriver::new(step_budget),
            config,
            population,
            evolver,
            reporters: vec![],
            statistics: StatisticsReporter::from_history(history),
            best,
        }
    }

    /// Replaces the reproduction step.
    #[must_use]
    pub fn with_evolver<W>(self, evolver: W) -> Trainer<W>
    where
        W: Evolver,
    {
        Trainer {
            config: self.config,
            population: self.population,
            evolver,
            driver: self.driver,
            checkpointer: self.checkpointer,
            reporters: self.reporters,
            statistics: self.statistics,
            best: self.best,
        }
    }

    #[must_use]
    pub fn with_reporter<R>(mut self, reporter: R) -> Self
    where
        R: Reporter + 'static,
    {
        self.reporters.push(Box::new(reporter));
        self
    }

    /// Overrides the driver built from the step budget, e.g. to change the
    /// frame rate of rendered evaluations.
    #[must_use]
    pub fn with_driver(mut self, driver: EpisodeDriver) -> Self {
        self.driver = driver;
        self
    }

    #[must_use]
    pub fn with_checkpointer(mut self, checkpointer: Option<Checkpointer>) -> Self {
        self.checkpointer = checkpointer;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn statistics(&self) -> &StatisticsReporter {
        &self.statistics
    }

    #[must_use]
    pub fn best(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            saved_at: Utc::now(),
            config: self.config.clone(),
            population: self.population.clone(),
            best: self.best.clone(),
            history: self.statistics.history().to_vec(),
        }
    }

    /// Runs generations until the configured limit, the fitness threshold,
    /// or a quit signal.
    ///
    /// Each generation plays on `env` reseeded with `config.seed` plus the
    /// generation number. A quit ends the run without reproducing the
    /// interrupted generation.
    ///
    /// # Errors
    ///
    /// Fails when the genomes do not fit the environment's state width, when
    /// an evaluation episode fails, or when a checkpoint cannot be written.
    pub fn run<E, S>(
        &mut self,
        env: &mut E,
        signals: &mut S,
    ) -> Result<TrainingOutcome, TrainingError<E::Error>>
    where
        E: Environment + Reseed + ?Sized,
        S: SignalSource + ?Sized,
    {
        if let Some(genome) = self
            .population
            .genomes()
            .iter()
            .find(|g| g.network().num_inputs != env.state_size())
        {
            return Err(TrainingError::StateSize {
                expected: env.state_size(),
                found: genome.network().num_inputs,
            });
        }

        let mut stop = TrainingStop::GenerationLimit;
        let mut generations = 0;
        while self.population.generation() < self.config.generations {
            let generation = self.population.generation();
            for reporter in &mut self.reporters {
                reporter.start_generation(generation);
            }

            let start = Instant::now();
            let seed = self.config.seed.wrapping_add(generation as u64);
            if self
                .population
                .evaluate(env, &self.driver, signals, seed)?
                .is_break()
            {
                stop = TrainingStop::UserExit;
                break;
            }
            generations += 1;

            let Some(report) = GenerationReport::from_population(&self.population, start.elapsed())
            else {
                break;
            };
            self.statistics.end_generation(&report);
            for reporter in &mut self.reporters {
                reporter.end_generation(&report);
            }
            let improved = self.population.best().filter(|best| {
                self.best
                    .as_ref()
                    .is_none_or(|b| b.fitness() < best.fitness())
            });
            if let Some(best) = improved {
                self.best = Some(best.clone());
            }

            if self
                .config
                .fitness_threshold
                .is_some_and(|threshold| report.best_fitness >= threshold)
            {
                for reporter in &mut self.reporters {
                    reporter.found_solution(&report);
                }
                stop = TrainingStop::FitnessThreshold;
                break;
            }

            self.population = self.evolver.evolve(&self.population);

            let next_generation = self.population.generation();
            let due = self
                .checkpointer
                .as_ref()
                .filter(|checkpointer| checkpointer.is_due(next_generation));
            if let Some(checkpointer) = due {
                let path = checkpointer.save(&self.checkpoint())?;
                for reporter in &mut self.reporters {
                    reporter.checkpoint_saved(next_generation, &path);
                }
            }
        }

        tracing::info!(
            %stop,
            generations,
            best_fitness = self.best.as_ref().and_then(Genome::fitness),
            "training finished"
        );
        Ok(TrainingOutcome {
            stop,
            generations,
            best: self.best.clone(),
        })
    }
}
