use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use tetrabot_engine::{BoardFeatures, EnvConfig, TetrisEnv};
use tetrabot_harness::{
    CsvEpisodeLog, EpisodeDriver, EvaluationLoop, NoSignals, RunContext, RunSummary,
    TensorBoardLog, Telemetry,
};
use tetrabot_policy::{Policy, ValueNetwork};

use crate::{
    logging,
    terminal::{KeySignals, TerminalEnv},
};

/// Options shared by every command that plays evaluation episodes.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvalArgs {
    /// Maximum number of episodes to play
    #[arg(long, default_value_t = 125)]
    max_episodes: usize,
    /// Step budget of each episode
    #[arg(long, default_value = "5000")]
    max_steps: NonZeroUsize,
    /// Frames per second while rendering
    #[arg(long, default_value_t = EpisodeDriver::DEFAULT_FRAMERATE)]
    framerate: u32,
    /// Log a summary every this many episodes
    #[arg(long, default_value = "1")]
    print_interval: NonZeroUsize,
    /// Seed of the first episode; each following episode uses the next value
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Disable the hold slot
    #[arg(long)]
    no_hold: bool,
    /// CSV file receiving one row per episode (appended)
    #[arg(long, default_value = "evaluation/eval_test.csv")]
    csv: PathBuf,
    /// Directory for TensorBoard event files
    #[arg(long)]
    tensorboard: Option<PathBuf>,
    /// Run without terminal UI and keyboard control; logs go to stderr
    #[arg(long)]
    headless: bool,
    /// Start with rendering switched off (toggle with `r`)
    #[arg(long)]
    no_render: bool,
    /// Log file used while the terminal UI is active
    #[arg(long, default_value = "tetrabot.log")]
    log_file: PathBuf,
}

impl EvalArgs {
    pub(crate) fn env(&self) -> TetrisEnv {
        let config = EnvConfig {
            hold_enabled: !self.no_hold,
        };
        TetrisEnv::new(config, self.seed)
    }

    pub(crate) fn init_logging(&self) -> anyhow::Result<()> {
        logging::init((!self.headless).then_some(self.log_file.as_path()))
    }

    fn telemetry(&self) -> anyhow::Result<Telemetry> {
        let csv = CsvEpisodeLog::open(&self.csv)
            .with_context(|| format!("Failed to open episode log: {}", self.csv.display()))?;
        let mut telemetry = Telemetry::new().with_sink("csv", csv);
        if let Some(dir) = &self.tensorboard {
            let tensorboard = TensorBoardLog::create(dir).with_context(|| {
                format!("Failed to create TensorBoard log dir: {}", dir.display())
            })?;
            telemetry.push("tensorboard", tensorboard);
        }
        Ok(telemetry)
    }

    /// Plays the evaluation episodes with `policy` and logs the final summary.
    pub(crate) fn run(&self, policy: &Policy) -> anyhow::Result<RunSummary> {
        let mut ctx = RunContext::new(self.telemetry()?, self.print_interval);
        let driver = EpisodeDriver::new(self.max_steps).framerate(self.framerate);
        let evaluation = EvaluationLoop::new(self.max_episodes, driver);
        let mut env = self.env();

        tracing::info!(
            max_episodes = self.max_episodes,
            max_steps = self.max_steps.get(),
            seed = self.seed,
            hold = !self.no_hold,
            "starting evaluation"
        );
        let played = if self.headless {
            evaluation.run(&mut env, policy, &mut NoSignals, &mut ctx)
        } else {
            ratatui::run(|terminal| {
                let mut env = TerminalEnv::new(env, terminal, !self.no_render);
                evaluation.run(&mut env, policy, &mut KeySignals, &mut ctx)
            })
        }
        .context("Evaluation episode failed")?;

        let summary = ctx.close();
        tracing::info!(played, "evaluation finished");
        summary.log();
        Ok(summary)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Path to the value-network model file (JSON format)
    model_path: PathBuf,
    #[clap(flatten)]
    eval: EvalArgs,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg { model_path, eval } = arg;
    eval.init_logging()?;

    let network = ValueNetwork::load(model_path, BoardFeatures::LEN)
        .with_context(|| format!("Failed to load model: {}", model_path.display()))?;
    let summary = eval.run(&Policy::from(network))?;

    eprintln!(
        "Played {} episodes, highscore {}, tetris highscore {}",
        summary.episodes, summary.highscore, summary.tetris_highscore
    );
    Ok(())
}
