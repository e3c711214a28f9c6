use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{genome::GenomeId, population::Population};

/// Fitness figures of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub best_genome: GenomeId,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    pub min_fitness: f32,
    pub std_dev: f32,
    pub evaluated: usize,
    pub elapsed_secs: f64,
}

impl GenerationReport {
    /// `None` until at least one genome of `population` has a fitness.
    #[must_use]
    pub fn from_population(population: &Population, elapsed: Duration) -> Option<Self> {
        let best = population.best()?;
        let stats = population.fitness_stats()?;
        Some(Self {
            generation: population.generation(),
            best_genome: best.id(),
            best_fitness: stats.max,
            mean_fitness: stats.mean,
            min_fitness: stats.min,
            std_dev: stats.std_dev,
            evaluated: stats.count,
            elapsed_secs: elapsed.as_secs_f64(),
        })
    }
}

/// Observer of a training run.
pub trait Reporter {
    fn start_generation(&mut self, _generation: usize) {}

    fn end_generation(&mut self, _report: &GenerationReport) {}

    /// The best fitness reached the configured threshold.
    fn found_solution(&mut self, _report: &GenerationReport) {}

    fn checkpoint_saved(&mut self, _generation: usize, _path: &Path) {}
}

impl<R> Reporter for Box<R>
where
    R: Reporter + ?Sized,
{
    fn start_generation(&mut self, generation: usize) {
        (**self).start_generation(generation);
    }

    fn end_generation(&mut self, report: &GenerationReport) {
        (**self).end_generation(report);
    }

    fn found_solution(&mut self, report: &GenerationReport) {
        (**self).found_solution(report);
    }

    fn checkpoint_saved(&mut self, generation: usize, path: &Path) {
        (**self).checkpoint_saved(generation, path);
    }
}

/// Reports progress as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn start_generation(&mut self, generation: usize) {
        tracing::debug!(generation, "generation started");
    }

    fn end_generation(&mut self, report: &GenerationReport) {
        tracing::info!(
            generation = report.generation,
            best_genome = %report.best_genome,
            best_fitness = report.best_fitness,
            mean_fitness = report.mean_fitness,
            min_fitness = report.min_fitness,
            std_dev = report.std_dev,
            elapsed_secs = report.elapsed_secs,
            "generation evaluated"
        );
    }

    fn found_solution(&mut self, report: &GenerationReport) {
        tracing::info!(
            generation = report.generation,
            best_genome = %report.best_genome,
            best_fitness = report.best_fitness,
            "fitness threshold reached"
        );
    }

    fn checkpoint_saved(&mut self, generation: usize, path: &Path) {
        tracing::info!(generation, path = %path.display(), "checkpoint saved");
    }
}

/// Keeps every generation report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticsReporter {
    history: Vec<GenerationReport>,
}

impl StatisticsReporter {
    #[must_use]
    pub fn from_history(history: Vec<GenerationReport>) -> Self {
        Self { history }
    }

    #[must_use]
    pub fn history(&self) -> &[GenerationReport] {
        &self.history
    }

    /// Best fitness per generation.
    #[must_use]
    pub fn best_fitness(&self) -> Vec<f32> {
        self.history.iter().map(|r| r.best_fitness).collect()
    }

    #[must_use]
    pub fn mean_fitness(&self) -> Vec<f32> {
        self.history.iter().map(|r| r.mean_fitness).collect()
    }

    /// Report of the generation with the highest best fitness.
    #[must_use]
    pub fn best_generation(&self) -> Option<&GenerationReport> {
        self.history
            .iter()
            .reduce(|best, r| if r.best_fitness > best.best_fitness { r } else { best })
    }
}

impl Reporter for StatisticsReporter {
    fn end_generation(&mut self, report: &GenerationReport) {
        self.history.push(*report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(generation: usize, best: f32, mean: f32) -> GenerationReport {
        GenerationReport {
            generation,
            best_genome: GenomeId(generation as u64),
            best_fitness: best,
            mean_fitness: mean,
            min_fitness: 0.0,
            std_dev: 0.0,
            evaluated: 3,
            elapsed_secs: 0.0,
        }
    }

    #[test]
    fn statistics_track_each_generation() {
        let mut stats = StatisticsReporter::default();
        for r in [report(0, 4.0, 1.0), report(1, 9.0, 3.0), report(2, 9.0, 5.0)] {
            stats.end_generation(&r);
        }
        assert_eq!(stats.best_fitness(), [4.0, 9.0, 9.0]);
        assert_eq!(stats.mean_fitness(), [1.0, 3.0, 5.0]);
        assert_eq!(stats.best_generation().map(|r| r.generation), Some(1));
    }
}
