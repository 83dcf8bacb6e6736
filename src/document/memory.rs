use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::TimeSpan;
use crate::error::{ProjectionError, ProjectionResult};
use crate::model::{ListModel, SharedModel, VecModel};

use super::{CounterValue, Document, Mark, MarkCatalog, Sample, Timed};

/// Capture held entirely in memory, one ascending list model per frame kind.
#[derive(Debug)]
pub struct MemoryDocument {
    time_span: TimeSpan,
    samples: Rc<VecModel<Sample>>,
    marks: Rc<VecModel<Mark>>,
    counter_values: Rc<VecModel<CounterValue>>,
}

impl MemoryDocument {
    #[must_use]
    pub fn new(time_span: TimeSpan) -> Self {
        Self {
            time_span: time_span.order(),
            samples: Rc::new(VecModel::new()),
            marks: Rc::new(VecModel::new()),
            counter_values: Rc::new(VecModel::new()),
        }
    }

    pub fn with_samples(self, samples: Vec<Sample>) -> ProjectionResult<Self> {
        append_ordered("samples", &self.samples, samples)?;
        Ok(self)
    }

    pub fn with_marks(self, marks: Vec<Mark>) -> ProjectionResult<Self> {
        append_ordered("marks", &self.marks, marks)?;
        Ok(self)
    }

    pub fn with_counter_values(self, values: Vec<CounterValue>) -> ProjectionResult<Self> {
        append_ordered("counter values", &self.counter_values, values)?;
        Ok(self)
    }

    /// Appends streamed samples; they must not precede the current tail.
    pub fn append_samples(&self, samples: Vec<Sample>) -> ProjectionResult<()> {
        append_ordered("samples", &self.samples, samples)
    }

    pub fn append_marks(&self, marks: Vec<Mark>) -> ProjectionResult<()> {
        append_ordered("marks", &self.marks, marks)
    }

    pub fn append_counter_values(&self, values: Vec<CounterValue>) -> ProjectionResult<()> {
        append_ordered("counter values", &self.counter_values, values)
    }

    #[must_use]
    pub fn samples(&self) -> SharedModel<Sample> {
        self.samples.clone()
    }

    #[must_use]
    pub fn marks(&self) -> SharedModel<Mark> {
        self.marks.clone()
    }

    #[must_use]
    pub fn counter_values(&self) -> SharedModel<CounterValue> {
        self.counter_values.clone()
    }

    /// Groups marks by `(group, name)` in first-seen order.
    #[must_use]
    pub fn mark_catalogs(&self) -> Vec<MarkCatalog> {
        let mut grouped: IndexMap<(String, String), Vec<Mark>> = IndexMap::new();
        self.marks.with_items(|marks| {
            for mark in marks {
                grouped
                    .entry((mark.group.clone(), mark.name.clone()))
                    .or_default()
                    .push(mark.clone());
            }
        });

        grouped
            .into_iter()
            .map(|((group, name), marks)| MarkCatalog::new(group, name, marks))
            .collect()
    }
}

impl Document for MemoryDocument {
    fn time_span(&self) -> TimeSpan {
        self.time_span
    }
}

fn append_ordered<T>(kind: &str, store: &VecModel<T>, items: Vec<T>) -> ProjectionResult<()>
where
    T: Timed + Clone + 'static,
{
    let mut previous = store
        .n_items()
        .checked_sub(1)
        .and_then(|last| store.item(last))
        .map(|item| item.time_nsec());

    for (index, item) in items.iter().enumerate() {
        let time = item.time_nsec();
        if let Some(previous) = previous {
            if time < previous {
                return Err(ProjectionError::InvalidData(format!(
                    "{kind} out of order at index {index}: {time} < {previous}"
                )));
            }
        }
        previous = Some(time);
    }

    debug!(kind, count = items.len(), "document frames appended");
    store.append(items);
    Ok(())
}
