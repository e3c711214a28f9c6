use std::path::PathBuf;

use anyhow::{Context, ensure};
use tetrabot_engine::BoardFeatures;
use tetrabot_policy::{EvolvedNetwork, Policy};

use crate::util;

use super::evaluate::EvalArgs;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayGenomeArg {
    /// Path to a genome saved by `train` (JSON format)
    genome_path: PathBuf,
    #[clap(flatten)]
    eval: EvalArgs,
}

pub(crate) fn run(arg: &PlayGenomeArg) -> anyhow::Result<()> {
    let PlayGenomeArg { genome_path, eval } = arg;
    eval.init_logging()?;

    let saved = util::read_saved_genome(genome_path)?;
    ensure!(
        saved.network.num_inputs == BoardFeatures::LEN,
        "Genome expects {} inputs but the environment provides {}: {}",
        saved.network.num_inputs,
        BoardFeatures::LEN,
        genome_path.display()
    );
    let network = EvolvedNetwork::from_genome(&saved.network)
        .with_context(|| format!("Invalid genome network: {}", genome_path.display()))?;
    tracing::info!(
        name = %saved.name,
        genome = %saved.genome_id,
        fitness = ?saved.fitness,
        trained_at = %saved.trained_at,
        "loaded genome"
    );

    let summary = eval.run(&Policy::from(network))?;
    eprintln!(
        "Played {} episodes with {}, highscore {}",
        summary.episodes, saved.name, summary.highscore
    );
    Ok(())
}
