use crate::task::TaskId;
use core::time::Duration;

/// Per-task durations for one completed batch, ordered by task identifier.
///
/// Slot `i` holds the duration reported for task `i + 1`, regardless of the
/// order in which the records arrived.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimingSeries {
    durations: Vec<Duration>,
}

impl TimingSeries {
    pub const fn empty() -> Self {
        Self {
            durations: Vec::new(),
        }
    }

    /// Number of tasks in the batch.
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Returns the duration recorded for `task`, if it belongs to the batch.
    pub fn get(&self, task: TaskId) -> Option<Duration> {
        task.checked_sub(1)
            .and_then(|slot| self.durations.get(slot))
            .copied()
    }

    pub fn as_slice(&self) -> &[Duration] {
        &self.durations
    }

    pub fn iter(&self) -> impl Iterator<Item = Duration> + '_ {
        self.durations.iter().copied()
    }

    /// Durations in seconds, the unit the charts are drawn in.
    pub fn as_secs_f64(&self) -> Vec<f64> {
        self.durations.iter().map(Duration::as_secs_f64).collect()
    }

    /// Sum of all per-task durations.
    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }

    pub fn mean(&self) -> Option<Duration> {
        let len = u32::try_from(self.durations.len()).ok()?;
        (len > 0).then(|| self.total() / len)
    }

    pub fn max(&self) -> Option<Duration> {
        self.durations.iter().max().copied()
    }

    pub fn into_inner(self) -> Vec<Duration> {
        self.durations
    }
}

impl From<Vec<Duration>> for TimingSeries {
    fn from(durations: Vec<Duration>) -> Self {
        Self { durations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_one_indexed() {
        let series = TimingSeries::from(vec![
            Duration::from_millis(3),
            Duration::from_millis(1),
            Duration::from_millis(2),
        ]);

        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), Some(Duration::from_millis(3)));
        assert_eq!(series.get(3), Some(Duration::from_millis(2)));
        assert_eq!(series.get(4), None);
    }

    #[test]
    fn aggregates() {
        let series = TimingSeries::from(vec![
            Duration::from_millis(10),
            Duration::from_millis(30),
        ]);

        assert_eq!(series.total(), Duration::from_millis(40));
        assert_eq!(series.mean(), Some(Duration::from_millis(20)));
        assert_eq!(series.max(), Some(Duration::from_millis(30)));
        assert_eq!(series.as_secs_f64(), vec![0.01, 0.03]);
    }

    #[test]
    fn empty_series_has_no_mean() {
        let series = TimingSeries::empty();
        assert!(series.is_empty());
        assert_eq!(series.mean(), None);
        assert_eq!(series.max(), None);
        assert_eq!(series.total(), Duration::ZERO);
    }
}
