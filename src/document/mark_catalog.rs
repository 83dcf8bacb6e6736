use serde::Serialize;

use super::Mark;

/// All marks sharing one `(group, name)` label, with duration statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkCatalog {
    group: String,
    name: String,
    marks: Vec<Mark>,
    min_duration: i64,
    max_duration: i64,
    average_duration: i64,
    median_duration: i64,
}

impl MarkCatalog {
    /// Builds a catalog; `marks` keep their given order.
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>, marks: Vec<Mark>) -> Self {
        let mut durations: Vec<i64> = marks.iter().map(|mark| mark.duration_nsec).collect();
        durations.sort_unstable();

        let (min_duration, max_duration, average_duration, median_duration) =
            match (durations.first(), durations.last()) {
                (Some(&min), Some(&max)) => {
                    let total: i128 = durations.iter().map(|&d| i128::from(d)).sum();
                    let average = (total / durations.len() as i128) as i64;
                    (min, max, average, durations[durations.len() / 2])
                }
                _ => (0, 0, 0, 0),
            };

        Self {
            group: group.into(),
            name: name.into(),
            marks,
            min_duration,
            max_duration,
            average_duration,
            median_duration,
        }
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    #[must_use]
    pub fn min_duration(&self) -> i64 {
        self.min_duration
    }

    #[must_use]
    pub fn max_duration(&self) -> i64 {
        self.max_duration
    }

    #[must_use]
    pub fn average_duration(&self) -> i64 {
        self.average_duration
    }

    #[must_use]
    pub fn median_duration(&self) -> i64 {
        self.median_duration
    }
}
