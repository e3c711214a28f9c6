use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use tensorboard_rs::summary_writer::SummaryWriter;

use crate::record::EpisodeRecord;

/// Destination for per-episode results.
///
/// Metrics are recorded for every finished episode, including one cut short
/// by a quit; log rows are appended only for episodes the run keeps.
pub trait TelemetrySink {
    /// Scalar metrics for episode number `episode`.
    fn record_metrics(&mut self, _episode: usize, _record: &EpisodeRecord) -> io::Result<()> {
        Ok(())
    }

    /// One log row per kept episode.
    fn append_episode(&mut self, _record: &EpisodeRecord) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Appends `total_reward,ones,twos,threes,fours` rows to a CSV file.
///
/// The file is opened in append mode so that consecutive runs accumulate in
/// the same log; no header is written.
#[derive(Debug)]
pub struct CsvEpisodeLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvEpisodeLog {
    /// Opens `path` for appending, creating it and its parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be created.
    pub fn open<P>(path: P) -> io::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self { path, writer })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for CsvEpisodeLog {
    fn append_episode(&mut self, record: &EpisodeRecord) -> io::Result<()> {
        let [ones, twos, threes, fours] = record.clears.as_array();
        self.writer.write_record([
            record.total_reward.to_string(),
            ones.to_string(),
            twos.to_string(),
            threes.to_string(),
            fours.to_string(),
        ])?;
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Writes per-episode scalars as TensorBoard events.
pub struct TensorBoardLog {
    logdir: PathBuf,
    writer: SummaryWriter,
}

impl fmt::Debug for TensorBoardLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorBoardLog")
            .field("logdir", &self.logdir)
            .finish_non_exhaustive()
    }
}

impl TensorBoardLog {
    pub const TAG_TETRISES: &str = "Tetris clears";
    pub const TAG_TOTAL_REWARD: &str = "Total Reward";
    pub const TAG_STEPS: &str = "Steps per Episode";

    /// Creates an event writer under `logdir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `logdir` cannot be created.
    pub fn create<P>(logdir: P) -> io::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let logdir = logdir.into();
        fs::create_dir_all(&logdir)?;
        let writer = SummaryWriter::new(&logdir);
        Ok(Self { logdir, writer })
    }

    #[must_use]
    pub fn logdir(&self) -> &Path {
        &self.logdir
    }
}

impl TelemetrySink for TensorBoardLog {
    #[expect(clippy::cast_precision_loss)]
    fn record_metrics(&mut self, episode: usize, record: &EpisodeRecord) -> io::Result<()> {
        self.writer.add_scalar(
            Self::TAG_TETRISES,
            record.clears.tetrises() as f32,
            episode,
        );
        self.writer
            .add_scalar(Self::TAG_TOTAL_REWARD, record.total_reward, episode);
        self.writer
            .add_scalar(Self::TAG_STEPS, record.steps as f32, episode);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush();
        Ok(())
    }
}

/// Fan-out over the configured sinks.
///
/// Sink failures are logged and otherwise ignored so that a full disk or a
/// broken metrics directory never ends a run.
#[derive(Default)]
pub struct Telemetry {
    sinks: Vec<(&'static str, Box<dyn TelemetrySink>)>,
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|(name, _)| name))
            .finish()
    }
}

impl Telemetry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink; `name` identifies it in warnings.
    #[must_use]
    pub fn with_sink<S>(mut self, name: &'static str, sink: S) -> Self
    where
        S: TelemetrySink + 'static,
    {
        self.push(name, sink);
        self
    }

    pub fn push<S>(&mut self, name: &'static str, sink: S)
    where
        S: TelemetrySink + 'static,
    {
        self.sinks.push((name, Box::new(sink)));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn record_metrics(&mut self, episode: usize, record: &EpisodeRecord) {
        for (name, sink) in &mut self.sinks {
            if let Err(e) = sink.record_metrics(episode, record) {
                tracing::warn!(sink = *name, episode, error = %e, "failed to record metrics");
            }
        }
    }

    pub fn append_episode(&mut self, record: &EpisodeRecord) {
        for (name, sink) in &mut self.sinks {
            if let Err(e) = sink.append_episode(record) {
                tracing::warn!(sink = *name, error = %e, "failed to append episode row");
            }
        }
    }

    pub fn flush(&mut self) {
        for (name, sink) in &mut self.sinks {
            if let Err(e) = sink.flush() {
                tracing::warn!(sink = *name, error = %e, "failed to flush telemetry");
            }
        }
    }
}

impl<S> TelemetrySink for Box<S>
where
    S: TelemetrySink + ?Sized,
{
    fn record_metrics(&mut self, episode: usize, record: &EpisodeRecord) -> io::Result<()> {
        (**self).record_metrics(episode, record)
    }

    fn append_episode(&mut self, record: &EpisodeRecord) -> io::Result<()> {
        (**self).append_episode(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::Step;

    #[derive(Clone, Default)]
    struct Recorded(Rc<RefCell<Vec<String>>>);

    impl TelemetrySink for Recorded {
        fn record_metrics(&mut self, episode: usize, record: &EpisodeRecord) -> io::Result<()> {
            self.0
                .borrow_mut()
                .push(format!("metrics {episode} {}", record.steps));
            Ok(())
        }

        fn append_episode(&mut self, record: &EpisodeRecord) -> io::Result<()> {
            self.0.borrow_mut().push(format!("row {}", record.steps));
            Ok(())
        }
    }

    struct Broken;

    impl TelemetrySink for Broken {
        fn append_episode(&mut self, _record: &EpisodeRecord) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    fn record_with_steps(steps: usize) -> EpisodeRecord {
        let mut record = EpisodeRecord::new();
        for _ in 0..steps {
            record.complete_step(&Step {
                reward: 1.0,
                done: false,
                cleared_lines: 0,
            });
        }
        record
    }

    #[test]
    fn failing_sink_does_not_starve_the_others() {
        let recorded = Recorded::default();
        let mut telemetry = Telemetry::new()
            .with_sink("broken", Broken)
            .with_sink("recorded", recorded.clone());

        telemetry.record_metrics(0, &record_with_steps(3));
        telemetry.append_episode(&record_with_steps(3));
        telemetry.flush();

        assert_eq!(*recorded.0.borrow(), ["metrics 0 3", "row 3"]);
    }

    #[test]
    fn csv_rows_append_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/eval.csv");

        let mut record = EpisodeRecord::new();
        for lines in [0, 1, 4, 4, 2] {
            record.complete_step(&Step {
                reward: 1.5,
                done: false,
                cleared_lines: lines,
            });
        }

        let mut log = CsvEpisodeLog::open(&path).unwrap();
        log.append_episode(&record).unwrap();
        drop(log);
        let mut log = CsvEpisodeLog::open(&path).unwrap();
        log.append_episode(&EpisodeRecord::new()).unwrap();
        drop(log);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "7.5,1,1,0,2\n0,0,0,0,0\n");
    }

    #[test]
    fn tensorboard_scalars_reach_the_event_file() {
        let dir = tempfile::tempdir().unwrap();
        let logdir = dir.path().join("runs/eval");

        let mut log = TensorBoardLog::create(&logdir).unwrap();
        assert_eq!(log.logdir(), logdir);
        for episode in 0..3 {
            log.record_metrics(episode, &record_with_steps(episode + 1))
                .unwrap();
        }
        log.flush().unwrap();

        let written = fs::read_dir(&logdir)
            .unwrap()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_name().to_string_lossy().contains("tfevents"))
            .map(|entry| entry.metadata().unwrap().len())
            .sum::<u64>();
        assert!(written > 0, "no TensorBoard events under {}", logdir.display());
    }
}
