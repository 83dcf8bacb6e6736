use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use trace_projection::api::{Filter, Session, SessionOptions};
use trace_projection::core::{
    Axis, AxisValue, NSEC_PER_MSEC, NSEC_PER_SEC, NSEC_PER_USEC, Subscription, TimeSpan,
};
use trace_projection::document::{
    CounterValue, Document, DocumentItem, LogMessage, Mark, MemoryDocument, Process,
    Sample,
};

fn document(begin: i64, end: i64) -> Rc<dyn Document> {
    Rc::new(MemoryDocument::new(TimeSpan::new(begin, end)))
}

fn record_spans(
    signal: &trace_projection::core::Signal<TimeSpan>,
) -> (Rc<RefCell<Vec<TimeSpan>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = signal.connect(move |span: &TimeSpan| sink.borrow_mut().push(*span));
    (seen, subscription)
}

fn mark(time_nsec: i64, duration_nsec: i64) -> Mark {
    Mark {
        time_nsec,
        duration_nsec,
        group: "gtk".to_owned(),
        name: "frame".to_owned(),
        message: String::new(),
    }
}

#[test]
fn new_session_selects_the_whole_document() {
    let session = Session::new(document(1_000, 5_000));

    assert_eq!(session.document_time(), TimeSpan::new(1_000, 5_000));
    assert_eq!(session.selected_time(), TimeSpan::new(1_000, 5_000));
    assert_eq!(session.visible_time(), TimeSpan::new(1_000, 5_000));
    assert_relative_eq!(session.selected_time_axis().min(), 1_000.0);
    assert_relative_eq!(session.visible_time_axis().max(), 5_000.0);
    assert!(session.filter().is_empty());
}

#[test]
fn selection_is_ordered_and_clamped() {
    let session = Session::new(document(0, 1_000));
    let (selected, _a) = record_spans(session.selected_time_changed());
    let (visible, _b) = record_spans(session.visible_time_changed());

    session.select_time(Some(TimeSpan::new(1_500, 200)));

    assert_eq!(session.selected_time(), TimeSpan::new(200, 1_000));
    assert_eq!(*selected.borrow(), vec![TimeSpan::new(200, 1_000)]);
    assert!(visible.borrow().is_empty());
    assert_relative_eq!(session.selected_time_axis().min(), 200.0);
    assert_relative_eq!(session.selected_time_axis().max(), 1_000.0);
}

#[test]
fn null_selection_resets_to_document() {
    let session = Session::new(document(0, 1_000));
    session.select_time(Some(TimeSpan::new(100, 200)));
    session.select_time(None);
    assert_eq!(session.selected_time(), TimeSpan::new(0, 1_000));
}

#[test]
fn disjoint_selection_collapses() {
    let session = Session::new(document(1_000, 2_000));
    session.select_time(Some(TimeSpan::new(5_000, 6_000)));
    assert_eq!(session.selected_time(), TimeSpan::new(0, 0));
}

#[test]
fn zoom_narrows_visible_and_keeps_selection() {
    let session = Session::new(document(0, 1_000));
    let (visible, _subscription) = record_spans(session.visible_time_changed());

    session.select_time(Some(TimeSpan::new(100, 300)));
    session.zoom_to_selection();
    session.zoom_to_selection();

    assert_eq!(session.visible_time(), TimeSpan::new(100, 300));
    assert_eq!(session.selected_time(), TimeSpan::new(100, 300));
    assert_eq!(*visible.borrow(), vec![TimeSpan::new(100, 300)]);
    assert_relative_eq!(session.visible_time_axis().min(), 100.0);
    assert_relative_eq!(session.visible_time_axis().max(), 300.0);
}

#[test]
fn visible_axis_is_current_while_zoom_notifies() {
    let session = Session::new(document(0, 1_000));
    session.select_time(Some(TimeSpan::new(100, 200)));

    let axis = session.visible_time_axis();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _subscription = session
        .visible_time_changed()
        .connect(move |_: &TimeSpan| sink.borrow_mut().push((axis.min(), axis.max())));

    session.zoom_to_selection();

    assert_eq!(seen.borrow().len(), 1);
    let (min, max) = seen.borrow()[0];
    assert_relative_eq!(min, 100.0);
    assert_relative_eq!(max, 200.0);
}

#[test]
fn selection_outside_visible_grows_it() {
    let session = Session::new(document(0, 1_000));
    session.select_time(Some(TimeSpan::new(400, 500)));
    session.zoom_to_selection();
    let (visible, _subscription) = record_spans(session.visible_time_changed());

    session.select_time(Some(TimeSpan::new(450, 480)));
    assert!(visible.borrow().is_empty());

    session.select_time(Some(TimeSpan::new(300, 450)));
    assert_eq!(session.visible_time(), TimeSpan::new(300, 500));
    assert_eq!(*visible.borrow(), vec![TimeSpan::new(300, 500)]);
    assert!(session.visible_time().contains_span(session.selected_time()));
    assert_relative_eq!(session.visible_time_axis().min(), 300.0);
}

#[test]
fn axes_drive_normalization_of_timestamps() {
    let session = Session::new(document(0, 1_000));
    session.select_time(Some(TimeSpan::new(200, 600)));

    let (selected_axis, visible_axis) = session.axes();
    assert_relative_eq!(selected_axis.normalize(400.0), 0.5);
    assert_relative_eq!(visible_axis.normalize(500.0), 0.5);
}

#[test]
fn filter_by_mark_replaces_and_clears() {
    let doc = Rc::new(
        MemoryDocument::new(TimeSpan::new(1_000, 10_000))
            .with_marks(vec![mark(2_000, 500), mark(6_000, 0)])
            .expect("ordered marks"),
    );
    let catalogs = doc.mark_catalogs();
    let session = Session::new(doc);
    let changes = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&changes);
    let _subscription = session
        .filter()
        .changed()
        .connect(move |_: &()| *counter.borrow_mut() += 1);

    session.filter_by_mark(catalogs.first());
    session.filter_by_mark(catalogs.first());
    assert_eq!(session.filter().len(), 1);

    let filter = session.filter();
    let inside = Sample { time_nsec: 2_200, cpu: 0, pid: 1, tid: 1 };
    let outside = Sample { time_nsec: 6_000, cpu: 0, pid: 1, tid: 1 };
    assert!(filter.matches(&inside));
    assert!(!filter.matches(&outside));

    session.filter_by_mark(None);
    session.filter_by_mark(None);
    assert!(session.filter().is_empty());
    assert!(filter.matches(&outside));
    assert_eq!(*changes.borrow(), 3);
}

#[test]
fn options_notify_only_on_change() {
    let session = Session::new(document(0, 1));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _subscription = session
        .options_changed()
        .connect(move |options: &SessionOptions| sink.borrow_mut().push(*options));

    session.update_options(|options| options.bottom_up = true);
    session.update_options(|options| options.bottom_up = true);
    session.set_options(SessionOptions::default());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].bottom_up);
    assert!(!seen[1].bottom_up);
    assert_eq!(session.options(), SessionOptions::default());
}

#[test]
fn describe_uses_document_relative_times() {
    let origin = 10 * NSEC_PER_SEC;
    let session = Session::new(document(origin, origin + 60 * NSEC_PER_SEC));

    let mut frame = mark(origin + NSEC_PER_MSEC + 500 * NSEC_PER_USEC, 250 * NSEC_PER_USEC);
    assert_eq!(
        session.describe(DocumentItem::Mark(&frame)).as_deref(),
        Some("1.500 ms (250.000 μs): gtk / frame")
    );
    frame.message = "dropped".to_owned();
    assert_eq!(
        session.describe(DocumentItem::Mark(&frame)).as_deref(),
        Some("1.500 ms (250.000 μs): gtk / frame: dropped")
    );

    let counter = CounterValue {
        time_nsec: origin + 2 * NSEC_PER_SEC,
        counter_id: 3,
        value: AxisValue::from(0.5_f64),
    };
    assert_eq!(
        session.describe(DocumentItem::CounterValue(&counter)).as_deref(),
        Some("2.000 s: 0.500000")
    );

    let log = LogMessage {
        time_nsec: origin,
        domain: "Gtk".to_owned(),
        message: "warning".to_owned(),
    };
    assert_eq!(
        session.describe(DocumentItem::Log(&log)).as_deref(),
        Some("0.000 s: Gtk: warning")
    );

    let process = Process {
        time_nsec: origin - NSEC_PER_SEC,
        exit_time_nsec: origin + 3 * NSEC_PER_SEC,
        pid: 42,
        title: "gnome-shell [42]".to_owned(),
    };
    assert_eq!(
        session.describe(DocumentItem::Process(&process)).as_deref(),
        Some("0.000 s (3.000 s): gnome-shell [42]")
    );

    let sample = Sample { time_nsec: origin, cpu: 0, pid: 1, tid: 1 };
    assert_eq!(session.describe(DocumentItem::Sample(&sample)), None);
}
