use clap::{Parser, Subcommand};

use self::{evaluate::EvaluateArg, play_genome::PlayGenomeArg, train::TrainArg};

mod evaluate;
mod play_genome;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evaluate a trained value network over a series of episodes
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Evaluate a genome saved by `train`
    PlayGenome(#[clap(flatten)] PlayGenomeArg),
    /// Evolve network weights with a genetic algorithm
    Train(#[clap(flatten)] TrainArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::PlayGenome(arg) => play_genome::run(&arg)?,
        Mode::Train(arg) => train::run(&arg)?,
    }
    Ok(())
}
