//! Evolutionary training of [`EvolvedNetwork`] policies.
//!
//! Every genome of a generation plays one episode through the harness'
//! [`EpisodeDriver`]; the episode's total reward becomes its fitness. An
//! [`Evolver`] then breeds the next generation.
//!
//! # Training Cycle
//!
//! ```text
//! Population (generation g)
//!     ↓ evaluate: one episode per genome, env seeded with seed + g
//! Fitness per genome
//!     ↓ GenerationReport → reporters
//! Evolver (elitism, tournament, BLX-α, Gaussian mutation)
//!     ↓
//! Population (generation g + 1) ── checkpoint every N generations
//! ```
//!
//! The run ends after [`EvolutionConfig::generations`] generations, as soon as
//! a generation reaches [`EvolutionConfig::fitness_threshold`], or when a quit
//! signal interrupts an evaluation. The best genome seen is kept across
//! generations and can be written out as a [`SavedGenome`].
//!
//! # Current Limitations
//!
//! - **Fixed topology**: genomes keep the single hidden layer they start with;
//!   only weights and biases evolve
//! - **Single episode per genome**: fitness is noisy for stochastic agents
//! - **Sequential**: genomes are evaluated one after another on one environment
//!
//! [`EvolvedNetwork`]: tetrabot_policy::EvolvedNetwork
//! [`EpisodeDriver`]: tetrabot_harness::EpisodeDriver

pub use self::{
    checkpoint::*, config::*, error::*, evolver::*, genome::*, population::*, reporter::*,
    trainer::*,
};

mod checkpoint;
mod config;
mod error;
mod evolver;
mod genome;
pub mod params;
mod population;
mod reporter;
mod trainer;
