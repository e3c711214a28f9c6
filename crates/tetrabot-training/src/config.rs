use serde::{Deserialize, Serialize};
use tetrabot_policy::NodeActivation;

/// Hyperparameters of a training run.
///
/// Every field has a default, so a JSON configuration file only needs the
/// fields it changes:
///
/// ```
/// use tetrabot_training::EvolutionConfig;
///
/// let config: EvolutionConfig =
///     serde_json::from_str(r#"{ "population_size": 12, "fitness_threshold": 500.0 }"#).unwrap();
/// assert_eq!(config.population_size, 12);
/// assert_eq!(config.fitness_threshold, Some(500.0));
/// assert_eq!(config.elite_count, EvolutionConfig::default().elite_count);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Width of the single hidden layer.
    pub hidden_nodes: usize,
    pub activation: NodeActivation,
    /// Genomes copied unchanged into the next generation.
    pub elite_count: usize,
    /// Larger tournaments mean stronger selection pressure.
    pub tournament_size: usize,
    pub blx_alpha: f32,
    /// Per-parameter mutation probability.
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    /// Parameters are kept inside `[-weight_bound, weight_bound]`.
    pub weight_bound: f32,
    /// Generations to run, counted from generation 0.
    pub generations: usize,
    /// Stop as soon as the best fitness of a generation reaches this value.
    pub fitness_threshold: Option<f32>,
    /// Save a checkpoint every this many generations; 0 disables checkpoints.
    pub checkpoint_interval: usize,
    pub checkpoint_prefix: String,
    /// Step budget of each evaluation episode.
    pub step_budget: usize,
    /// Seeds both the initial population and the environment of generation 0.
    pub seed: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            hidden_nodes: 6,
            activation: NodeActivation::Sigmoid,
            elite_count: 2,
            tournament_size: 2,
            blx_alpha: 0.2,
            mutation_rate: 0.3,
            mutation_sigma: 0.5,
            weight_bound: 5.0,
            generations: 200,
            fitness_threshold: None,
            checkpoint_interval: 10,
            checkpoint_prefix: "checkpoints/neat-checkpoint-".to_owned(),
            step_budget: 50_000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid configuration: `{field}` {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |field, reason| Err(ConfigError { field, reason });
        if self.population_size == 0 {
            return fail("population_size", "must be positive");
        }
        if self.elite_count > self.population_size {
            return fail("elite_count", "must not exceed the population size");
        }
        if self.tournament_size == 0 {
            return fail("tournament_size", "must be positive");
        }
        if !(self.blx_alpha.is_finite() && self.blx_alpha >= 0.0) {
            return fail("blx_alpha", "must be a non-negative number");
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return fail("mutation_rate", "must be within [0, 1]");
        }
        if !(self.mutation_sigma.is_finite() && self.mutation_sigma >= 0.0) {
            return fail("mutation_sigma", "must be a non-negative number");
        }
        if !(self.weight_bound.is_finite() && self.weight_bound > 0.0) {
            return fail("weight_bound", "must be a positive number");
        }
        if self.step_budget == 0 {
            return fail("step_budget", "must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EvolutionConfig::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_fields_are_named() {
        let config = EvolutionConfig {
            elite_count: 31,
            ..EvolutionConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "elite_count");

        let config = EvolutionConfig {
            mutation_rate: 1.5,
            ..EvolutionConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "mutation_rate");

        let config = EvolutionConfig {
            weight_bound: f32::NAN,
            ..EvolutionConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "weight_bound");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EvolutionConfig {
            activation: NodeActivation::Tanh,
            fitness_threshold: Some(1.0e3),
            ..EvolutionConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""activation":"tanh""#));
        assert_eq!(serde_json::from_str::<EvolutionConfig>(&json).unwrap(), config);
    }
}
