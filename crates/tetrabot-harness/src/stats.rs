/// Summary of a series of episode results.
///
/// Uses the population standard deviation, so a single value has a spread of
/// zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
}

impl SummaryStats {
    /// Summarizes `values`, or returns `None` when there are none.
    ///
    /// ```
    /// use tetrabot_harness::SummaryStats;
    ///
    /// let stats = SummaryStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    /// assert_eq!(stats.count, 8);
    /// assert_eq!(stats.mean, 5.0);
    /// assert_eq!(stats.std_dev, 2.0);
    /// assert_eq!((stats.min, stats.max), (2.0, 9.0));
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let first = *values.first()?;
        let (min, max) = values
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
        let count = values.len();
        let n = count as f32;
        let mean = values.iter().sum::<f32>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;

        Some(Self {
            count,
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_summary() {
        assert_eq!(SummaryStats::new([]), None);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = SummaryStats::new([42.0]).unwrap();
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.std_dev, 0.0);
    }
}
