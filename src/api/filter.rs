use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::debug;

use crate::core::{Signal, TimeSpan};
use crate::document::{Document, MarkCatalog, Timed};

/// Frame predicate applied by views that honor the session filter.
pub trait Filter {
    fn matches(&self, frame: &dyn Timed) -> bool;
}

/// Matches frames whose offset from the document start falls inside any
/// non-empty mark of a catalog (endpoints inclusive).
///
/// Intervals are kept sorted by begin with a running maximum of their ends,
/// so a lookup is one binary search.
#[derive(Debug, Clone)]
pub struct MarkFilter {
    document_begin_nsec: i64,
    intervals: Vec<TimeSpan>,
    max_end_nsec: Vec<i64>,
}

impl MarkFilter {
    #[must_use]
    pub fn new(document: &dyn Document, catalog: &MarkCatalog) -> Self {
        let document_begin_nsec = document.time_span().begin_nsec;

        let mut intervals: Vec<TimeSpan> = catalog
            .marks()
            .iter()
            .filter(|mark| mark.duration_nsec != 0)
            .map(|mark| mark.time_span().order().relative_to(document_begin_nsec))
            .collect();
        intervals.sort_unstable_by_key(|span| span.begin_nsec);

        let max_end_nsec = intervals
            .iter()
            .scan(i64::MIN, |max_end, span| {
                *max_end = (*max_end).max(span.end_nsec);
                Some(*max_end)
            })
            .collect();

        debug!(
            group = catalog.group(),
            name = catalog.name(),
            intervals = intervals.len(),
            "mark filter built"
        );
        Self {
            document_begin_nsec,
            intervals,
            max_end_nsec,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    #[must_use]
    pub fn contains_offset(&self, offset_nsec: i64) -> bool {
        let candidates = self
            .intervals
            .partition_point(|span| span.begin_nsec <= offset_nsec);
        candidates > 0 && self.max_end_nsec[candidates - 1] >= offset_nsec
    }
}

impl Filter for MarkFilter {
    fn matches(&self, frame: &dyn Timed) -> bool {
        self.contains_offset(frame.time_nsec().saturating_sub(self.document_begin_nsec))
    }
}

/// Logical AND of its members; matches everything when empty.
pub struct EveryFilter {
    filters: RefCell<SmallVec<[Rc<dyn Filter>; 2]>>,
    changed: Signal<()>,
}

impl fmt::Debug for EveryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EveryFilter")
            .field("len", &self.len())
            .finish()
    }
}

impl Default for EveryFilter {
    fn default() -> Self {
        Self {
            filters: RefCell::new(SmallVec::new()),
            changed: Signal::new(),
        }
    }
}

impl EveryFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.borrow().is_empty()
    }

    pub fn append(&self, filter: Rc<dyn Filter>) {
        self.filters.borrow_mut().push(filter);
        self.changed.emit(&());
    }

    pub fn remove(&self, position: usize) -> Option<Rc<dyn Filter>> {
        let removed = {
            let mut filters = self.filters.borrow_mut();
            (position < filters.len()).then(|| filters.remove(position))
        };
        if removed.is_some() {
            self.changed.emit(&());
        }
        removed
    }

    pub fn clear(&self) {
        self.replace(None);
    }

    /// Swaps the whole member set for `filter` (or nothing) with one notification.
    pub fn replace(&self, filter: Option<Rc<dyn Filter>>) {
        let unchanged = {
            let mut filters = self.filters.borrow_mut();
            let was_empty = filters.is_empty();
            filters.clear();
            filters.extend(filter);
            was_empty && filters.is_empty()
        };
        if !unchanged {
            self.changed.emit(&());
        }
    }

    /// Fires after every membership change.
    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }
}

impl Filter for EveryFilter {
    fn matches(&self, frame: &dyn Timed) -> bool {
        let filters: SmallVec<[Rc<dyn Filter>; 2]> = self.filters.borrow().clone();
        filters.iter().all(|filter| filter.matches(frame))
    }
}
