use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tetrabot_policy::NetworkGenome;

use crate::{
    config::EvolutionConfig,
    genome::{Genome, GenomeId},
    population::Population,
    reporter::GenerationReport,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PersistError {
    #[display("failed to create {}", path.display())]
    Create { path: PathBuf, source: io::Error },
    #[display("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("failed to open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything needed to resume a run.
///
/// The population is the one about to be evaluated; its genomes carry no
/// fitness yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub saved_at: DateTime<Utc>,
    pub config: EvolutionConfig,
    pub population: Population,
    /// Best genome of the generations evaluated so far.
    pub best: Option<Genome>,
    pub history: Vec<GenerationReport>,
}

impl Checkpoint {
    pub fn load<P>(path: P) -> Result<Self, PersistError>
    where
        P: AsRef<Path>,
    {
        read_json(path.as_ref())
    }
}

/// Writes a [`Checkpoint`] to `{prefix}{generation}.json` every `interval`
/// generations.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    interval: NonZeroUsize,
    prefix: String,
}

impl Checkpointer {
    #[must_use]
    pub fn new(interval: NonZeroUsize, prefix: impl Into<String>) -> Self {
        Self {
            interval,
            prefix: prefix.into(),
        }
    }

    /// `None` when the configuration disables checkpoints.
    #[must_use]
    pub fn from_config(config: &EvolutionConfig) -> Option<Self> {
        let interval = NonZeroUsize::new(config.checkpoint_interval)?;
        Some(Self::new(interval, config.checkpoint_prefix.clone()))
    }

    /// Whether the population of `generation` should be saved.
    #[must_use]
    pub fn is_due(&self, generation: usize) -> bool {
        generation > 0 && generation % self.interval == 0
    }

    /// ```
    /// use std::{num::NonZeroUsize, path::Path};
    ///
    /// use tetrabot_training::Checkpointer;
    ///
    /// let checkpointer = Checkpointer::new(NonZeroUsize::new(5).unwrap(), "runs/ckpt-");
    /// assert_eq!(checkpointer.path_for(10), Path::new("runs/ckpt-10.json"));
    /// ```
    #[must_use]
    pub fn path_for(&self, generation: usize) -> PathBuf {
        PathBuf::from(format!("{}{generation}.json", self.prefix))
    }

    /// Saves `checkpoint` under the name of its population's generation.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<PathBuf, PersistError> {
        let path = self.path_for(checkpoint.population.generation());
        write_json(&path, checkpoint)?;
        Ok(path)
    }
}

/// Winner of a training run, loadable as a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGenome {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub genome_id: GenomeId,
    pub fitness: Option<f32>,
    pub network: NetworkGenome,
}

impl SavedGenome {
    #[must_use]
    pub fn new(name: impl Into<String>, genome: &Genome) -> Self {
        Self {
            name: name.into(),
            trained_at: Utc::now(),
            genome_id: genome.id(),
            fitness: genome.fitness(),
            network: genome.network().clone(),
        }
    }

    pub fn save<P>(&self, path: P) -> Result<(), PersistError>
    where
        P: AsRef<Path>,
    {
        write_json(path.as_ref(), self)
    }

    pub fn load<P>(path: P) -> Result<Self, PersistError>
    where
        P: AsRef<Path>,
    {
        read_json(path.as_ref())
    }
}

fn write_json<T>(path: &Path, value: &T) -> Result<(), PersistError>
where
    T: Serialize,
{
    let create = |source| PersistError::Create {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(create)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(create)?);
    serde_json::to_writer_pretty(&mut writer, value)
        .and_then(|()| writeln!(writer).map_err(serde_json::Error::io))
        .and_then(|()| writer.flush().map_err(serde_json::Error::io))
        .map_err(|source| PersistError::Write {
            path: path.to_owned(),
            source,
        })
}

fn read_json<T>(path: &Path) -> Result<T, PersistError>
where
    T: DeserializeOwned,
{
    let file = File::open(path).map_err(|source| PersistError::Open {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| PersistError::Parse {
        path: path.to_owned(),
        source,
    })
}
