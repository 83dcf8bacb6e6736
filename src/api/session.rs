use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::core::{Axis, Signal, TimeSpan, ValueAxis};
use crate::document::{Document, DocumentItem, MarkCatalog};

use super::config::SessionOptions;
use super::filter::{EveryFilter, Filter, MarkFilter};

/// Per-document coordinator owning the selected and visible time spans,
/// one axis mirroring each span, and the composed frame filter.
///
/// `visible_time` always contains `selected_time`.
pub struct Session {
    document: Rc<dyn Document>,
    selected_time: Cell<TimeSpan>,
    visible_time: Cell<TimeSpan>,
    selected_time_axis: Rc<ValueAxis>,
    visible_time_axis: Rc<ValueAxis>,
    filter: Rc<EveryFilter>,
    options: Cell<SessionOptions>,
    selected_time_changed: Signal<TimeSpan>,
    visible_time_changed: Signal<TimeSpan>,
    options_changed: Signal<SessionOptions>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("document_time", &self.document_time())
            .field("selected_time", &self.selected_time.get())
            .field("visible_time", &self.visible_time.get())
            .field("filters", &self.filter.len())
            .field("options", &self.options.get())
            .finish()
    }
}

impl Session {
    /// Opens a session selecting and showing the whole document.
    #[must_use]
    pub fn new(document: Rc<dyn Document>) -> Self {
        Self::with_options(document, SessionOptions::default())
    }

    #[must_use]
    pub fn with_options(document: Rc<dyn Document>, options: SessionOptions) -> Self {
        let document_time = document.time_span().order();
        let axis_for = |span: TimeSpan| {
            Rc::new(ValueAxis::new(span.begin_nsec as f64, span.end_nsec as f64))
        };

        debug!(
            begin = document_time.begin_nsec,
            end = document_time.end_nsec,
            "session opened"
        );
        Self {
            selected_time_axis: axis_for(document_time),
            visible_time_axis: axis_for(document_time),
            document,
            selected_time: Cell::new(document_time),
            visible_time: Cell::new(document_time),
            filter: Rc::new(EveryFilter::new()),
            options: Cell::new(options),
            selected_time_changed: Signal::new(),
            visible_time_changed: Signal::new(),
            options_changed: Signal::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Rc<dyn Document> {
        &self.document
    }

    /// Span of the whole capture, ordered.
    #[must_use]
    pub fn document_time(&self) -> TimeSpan {
        self.document.time_span().order()
    }

    #[must_use]
    pub fn selected_time(&self) -> TimeSpan {
        self.selected_time.get()
    }

    #[must_use]
    pub fn visible_time(&self) -> TimeSpan {
        self.visible_time.get()
    }

    /// Axis with `(min, max)` mirroring the selected span.
    #[must_use]
    pub fn selected_time_axis(&self) -> Rc<ValueAxis> {
        Rc::clone(&self.selected_time_axis)
    }

    /// Axis with `(min, max)` mirroring the visible span.
    #[must_use]
    pub fn visible_time_axis(&self) -> Rc<ValueAxis> {
        Rc::clone(&self.visible_time_axis)
    }

    #[must_use]
    pub fn filter(&self) -> Rc<EveryFilter> {
        Rc::clone(&self.filter)
    }

    /// Selects `span`, or the whole document when `None`.
    ///
    /// The selection is ordered and clamped to the document; a selection
    /// disjoint from it collapses to `(0, 0)`. The visible span grows to
    /// contain the selection but never shrinks here.
    pub fn select_time(&self, span: Option<TimeSpan>) {
        let document_time = self.document_time();
        let mut selected = span.unwrap_or(document_time).order();
        if !selected.clamp(document_time) {
            debug!("selection outside the document; collapsed");
        }
        self.selected_time.set(selected);

        let visible = self.visible_time.get();
        let grown = if visible.contains_span(selected) {
            visible
        } else {
            visible.union(selected)
        };
        let visible_grew = grown != visible;
        if visible_grew {
            self.visible_time.set(grown);
        }

        self.update_axes();
        debug!(
            begin = selected.begin_nsec,
            end = selected.end_nsec,
            visible_grew,
            "time selected"
        );

        self.selected_time_changed.emit(&selected);
        if visible_grew {
            self.visible_time_changed.emit(&grown);
        }
    }

    /// Shows exactly the selection. The selection itself is untouched.
    pub fn zoom_to_selection(&self) {
        let selected = self.selected_time.get();
        if self.visible_time.get() == selected {
            return;
        }
        self.visible_time.set(selected);
        debug!(
            begin = selected.begin_nsec,
            end = selected.end_nsec,
            "zoomed to selection"
        );
        self.update_axes();
        self.visible_time_changed.emit(&selected);
    }

    /// Restricts the session filter to frames inside `catalog`'s marks, or
    /// lifts every restriction when `None`.
    pub fn filter_by_mark(&self, catalog: Option<&MarkCatalog>) {
        let mark_filter = catalog.map(|catalog| {
            Rc::new(MarkFilter::new(self.document.as_ref(), catalog)) as Rc<dyn Filter>
        });
        debug!(
            catalog = ?catalog.map(MarkCatalog::name),
            "session filter replaced"
        );
        self.filter.replace(mark_filter);
    }

    #[must_use]
    pub fn options(&self) -> SessionOptions {
        self.options.get()
    }

    /// Replaces the view flags; notifies only on a real change.
    pub fn set_options(&self, options: SessionOptions) {
        if self.options.replace(options) != options {
            debug!(?options, "session options changed");
            self.options_changed.emit(&options);
        }
    }

    /// Applies `update` to a copy of the current options and stores the result.
    pub fn update_options(&self, update: impl FnOnce(&mut SessionOptions)) {
        let mut options = self.options.get();
        update(&mut options);
        self.set_options(options);
    }

    pub fn selected_time_changed(&self) -> &Signal<TimeSpan> {
        &self.selected_time_changed
    }

    pub fn visible_time_changed(&self) -> &Signal<TimeSpan> {
        &self.visible_time_changed
    }

    pub fn options_changed(&self) -> &Signal<SessionOptions> {
        &self.options_changed
    }

    /// One-line description of `item` with times relative to the document
    /// start, e.g. `1.500 ms (250.000 μs): gtk / frame`.
    ///
    /// Samples have no description.
    #[must_use]
    pub fn describe(&self, item: DocumentItem<'_>) -> Option<String> {
        let origin = self.document_time().begin_nsec;
        let relative = |begin: i64, end: i64| TimeSpan::new(begin, end).relative_to(origin);

        match item {
            DocumentItem::Sample(_) => None,
            DocumentItem::Mark(mark) => {
                let span = relative(mark.time_nsec, mark.end_time_nsec());
                let mut text = format!("{span}: {} / {}", mark.group, mark.name);
                if !mark.message.is_empty() {
                    text.push_str(": ");
                    text.push_str(&mark.message);
                }
                Some(text)
            }
            DocumentItem::CounterValue(value) => {
                let span = relative(value.time_nsec, value.time_nsec);
                Some(format!("{span}: {}", value.format_value()))
            }
            DocumentItem::Log(log) => {
                let span = relative(log.time_nsec, log.time_nsec);
                Some(format!("{span}: {}: {}", log.domain, log.message))
            }
            DocumentItem::Process(process) => {
                let mut span = relative(process.time_nsec, process.exit_time_nsec);
                span.begin_nsec = span.begin_nsec.max(0);
                Some(format!("{span}: {}", process.title))
            }
        }
    }

    fn update_axes(&self) {
        let selected = self.selected_time.get();
        let visible = self.visible_time.get();
        self.selected_time_axis
            .set_range(selected.begin_nsec as f64, selected.end_nsec as f64);
        self.visible_time_axis
            .set_range(visible.begin_nsec as f64, visible.end_nsec as f64);
    }

    /// Both axes as trait objects, for wiring into normalized series.
    #[must_use]
    pub fn axes(&self) -> (Rc<dyn Axis>, Rc<dyn Axis>) {
        let selected: Rc<dyn Axis> = self.selected_time_axis.clone();
        let visible: Rc<dyn Axis> = self.visible_time_axis.clone();
        (selected, visible)
    }
}
