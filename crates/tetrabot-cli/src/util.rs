use std::{fs::File, io, path::Path};

use anyhow::Context;
use tetrabot_training::{EvolutionConfig, SavedGenome};

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))?;

    Ok(value)
}

/// Read and validate evolution hyperparameters; missing fields take their defaults.
pub fn read_evolution_config<P>(path: P) -> anyhow::Result<EvolutionConfig>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let config: EvolutionConfig = read_json_file("evolution config", path)?;
    config
        .validate()
        .with_context(|| format!("Invalid evolution config: {}", path.display()))?;
    Ok(config)
}

pub fn read_saved_genome<P>(path: P) -> anyhow::Result<SavedGenome>
where
    P: AsRef<Path>,
{
    read_json_file("genome", path)
}
