use std::cell::RefCell;
use std::rc::Rc;

use trace_projection::core::{AxisValue, Subscription};
use trace_projection::document::Mark;
use trace_projection::model::{
    IdentityKind, ItemsChanged, ListModel, Series, SeriesKind, SharedModel, TimeSeries,
    TimeSeriesKind, VecModel, XyKind, XySeries,
};

fn record<M: ListModel + ?Sized>(model: &M) -> (Rc<RefCell<Vec<ItemsChanged>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = model
        .items_changed()
        .connect(move |change: &ItemsChanged| sink.borrow_mut().push(*change));
    (seen, subscription)
}

fn shared<T: Clone + 'static>(model: &Rc<VecModel<T>>) -> SharedModel<T> {
    model.clone()
}

#[test]
fn identity_series_mirrors_raw_items() {
    let raw = Rc::new(VecModel::from_vec(vec![3, 1, 4]));
    let series = Series::new(Some(shared(&raw)), IdentityKind);

    assert_eq!(series.n_items(), 3);
    assert_eq!(series.item(2), Some(4));
    assert_eq!(series.item(3), None);
}

#[test]
fn upstream_changes_are_forwarded_unchanged() {
    let raw = Rc::new(VecModel::from_vec(vec![1, 2, 3, 4]));
    let series = Series::new(Some(shared(&raw)), IdentityKind);
    let (seen, _subscription) = record(series.as_ref());

    raw.splice(1, 2, [9]);
    raw.push(7);

    assert_eq!(
        *seen.borrow(),
        vec![ItemsChanged::new(1, 2, 1), ItemsChanged::new(3, 0, 1)]
    );
    assert_eq!(series.n_items(), 4);
    assert_eq!(series.item(1), Some(9));
}

#[test]
fn rebinding_emits_whole_list_replacement() {
    let first = Rc::new(VecModel::from_vec(vec![1, 2, 3]));
    let second = Rc::new(VecModel::from_vec(vec![5, 6]));
    let series = Series::new(Some(shared(&first)), IdentityKind);
    let (seen, _subscription) = record(series.as_ref());

    series.set_model(Some(shared(&second)));
    series.set_model(Some(shared(&second)));
    series.set_model(None);

    assert_eq!(
        *seen.borrow(),
        vec![ItemsChanged::replace_all(3, 2), ItemsChanged::replace_all(2, 0)]
    );
    assert_eq!(series.n_items(), 0);
    assert_eq!(series.item(0), None);

    first.push(4);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn rebinding_between_empty_models_is_silent() {
    let empty_a = Rc::new(VecModel::<u8>::new());
    let empty_b = Rc::new(VecModel::<u8>::new());
    let series = Series::new(Some(shared(&empty_a)), IdentityKind);
    let (seen, _subscription) = record(series.as_ref());

    series.set_model(Some(shared(&empty_b)));
    assert!(seen.borrow().is_empty());
}

#[test]
fn xy_series_derives_coordinate_pairs() {
    let raw = Rc::new(VecModel::from_vec(vec![(1_i64, 2.5_f64), (2, 7.0)]));
    let series: Rc<XySeries<(i64, f64)>> = Series::new(
        Some(shared(&raw)),
        XyKind::new(|p: &(i64, f64)| AxisValue::from(p.0), |p: &(i64, f64)| AxisValue::from(p.1)),
    );

    let item = series.item(1).expect("second pair");
    assert_eq!(item.x, AxisValue::Int64(2));
    assert_eq!(item.y, AxisValue::Double(7.0));
    assert_eq!(item.item, (2, 7.0));
}

#[test]
fn time_series_derives_begin_end_pairs() {
    let marks = vec![Mark {
        time_nsec: 100,
        duration_nsec: 40,
        group: "gtk".to_owned(),
        name: "layout".to_owned(),
        message: String::new(),
    }];
    let raw = Rc::new(VecModel::from_vec(marks));
    let series: Rc<TimeSeries<Mark>> = Series::new(
        Some(shared(&raw)),
        TimeSeriesKind::new(|m: &Mark| m.time_nsec, Mark::end_time_nsec),
    );

    let item = series.item(0).expect("one mark");
    assert_eq!((item.begin_nsec, item.end_nsec), (100, 140));
    assert_eq!(item.duration(), 40);
}

struct PositionKind;

impl SeriesKind<char> for PositionKind {
    type Item = (usize, char);

    fn derive(&self, position: usize, item: char) -> (usize, char) {
        (position, item)
    }
}

#[test]
fn custom_kind_receives_raw_position() {
    let raw = Rc::new(VecModel::from_vec(vec!['a', 'b']));
    let series = Series::new(Some(shared(&raw)), PositionKind);
    assert_eq!(series.item(1), Some((1, 'b')));
}

#[test]
fn title_metadata() {
    let series = Series::<u8, IdentityKind>::new(None, IdentityKind);
    assert_eq!(series.title(), None);
    series.set_title(Some("CPU 0".to_owned()));
    assert_eq!(series.title().as_deref(), Some("CPU 0"));
}
