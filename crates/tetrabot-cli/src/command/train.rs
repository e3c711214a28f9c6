use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use tetrabot_engine::{BoardFeatures, EnvConfig, TetrisEnv};
use tetrabot_harness::{EpisodeDriver, NoSignals};
use tetrabot_training::{
    Checkpoint, EvolutionConfig, LogReporter, SavedGenome, Trainer, TrainingOutcome,
};

use crate::{
    logging,
    terminal::{KeySignals, TerminalEnv},
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Evolution hyperparameters (JSON format); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Resume from a checkpoint instead of a random population
    #[arg(long, conflicts_with = "config")]
    restore: Option<PathBuf>,
    /// Where to save the best genome
    #[arg(long, default_value = "best.json")]
    output: PathBuf,
    /// Disable the hold slot
    #[arg(long)]
    no_hold: bool,
    /// Run without terminal UI and keyboard control; logs go to stderr
    #[arg(long)]
    headless: bool,
    /// Start with rendering switched off (toggle with `r`)
    #[arg(long)]
    no_render: bool,
    /// Frames per second while rendering
    #[arg(long, default_value_t = EpisodeDriver::DEFAULT_FRAMERATE)]
    framerate: u32,
    /// Log file used while the terminal UI is active
    #[arg(long, default_value = "tetrabot.log")]
    log_file: PathBuf,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    logging::init((!arg.headless).then_some(arg.log_file.as_path()))?;

    let trainer = if let Some(path) = &arg.restore {
        let checkpoint = Checkpoint::load(path)?;
        Trainer::restore(checkpoint)
            .with_context(|| format!("Invalid checkpoint: {}", path.display()))?
    } else {
        let config = match &arg.config {
            Some(path) => util::read_evolution_config(path)?,
            None => EvolutionConfig::default(),
        };
        Trainer::new(config, BoardFeatures::LEN)?
    };
    let step_budget = trainer.config().step_budget;
    let mut trainer = trainer.with_reporter(LogReporter);
    if let Some(step_budget) = NonZeroUsize::new(step_budget) {
        trainer = trainer.with_driver(EpisodeDriver::new(step_budget).framerate(arg.framerate));
    }

    let env = TetrisEnv::new(
        EnvConfig {
            hold_enabled: !arg.no_hold,
        },
        trainer.config().seed,
    );
    let outcome = if arg.headless {
        let mut env = env;
        trainer.run(&mut env, &mut NoSignals)
    } else {
        ratatui::run(|terminal| {
            let mut env = TerminalEnv::new(env, terminal, !arg.no_render);
            trainer.run(&mut env, &mut KeySignals)
        })
    }
    .context("Training failed")?;

    report(&outcome);
    if let Some(best) = &outcome.best {
        SavedGenome::new("tetrabot-evolved", best).save(&arg.output)?;
        tracing::info!(path = %arg.output.display(), genome = %best.id(), "saved best genome");
        eprintln!("Saved best genome to {}", arg.output.display());
    }
    Ok(())
}

fn report(outcome: &TrainingOutcome) {
    tracing::info!(
        stop = %outcome.stop,
        generations = outcome.generations,
        best_fitness = ?outcome.best.as_ref().and_then(|g| g.fitness()),
        "training finished"
    );
    eprintln!(
        "Training stopped ({}) after {} generations",
        outcome.stop, outcome.generations
    );
}
