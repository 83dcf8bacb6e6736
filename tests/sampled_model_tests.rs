use std::cell::RefCell;
use std::rc::Rc;

use trace_projection::core::Subscription;
use trace_projection::model::{ItemsChanged, ListModel, SampledModel, SharedModel, VecModel};

fn record<M: ListModel + ?Sized>(model: &M) -> (Rc<RefCell<Vec<ItemsChanged>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = model
        .items_changed()
        .connect(move |change: &ItemsChanged| sink.borrow_mut().push(*change));
    (seen, subscription)
}

fn sampled(raw: &Rc<VecModel<u32>>, max_items: usize) -> Rc<SampledModel<u32>> {
    let shared: SharedModel<u32> = raw.clone();
    SampledModel::new(Some(shared), max_items)
}

#[test]
fn short_sequences_map_identically() {
    let raw = Rc::new(VecModel::from_vec(vec![7, 8, 9]));
    let model = sampled(&raw, 10);

    assert_eq!(model.n_items(), 3);
    assert_eq!(model.real_len(), 3);
    for i in 0..3 {
        assert_eq!(model.item(i), raw.item(i));
    }
    assert_eq!(model.item(3), None);
}

#[test]
fn long_sequences_are_capped_and_spread() {
    let raw = Rc::new(VecModel::from_vec((0..1_000).collect::<Vec<u32>>()));
    let model = sampled(&raw, 100);

    assert_eq!(model.n_items(), 100);
    assert_eq!(model.item(0), Some(0));
    assert_eq!(model.item(1), Some(10));
    assert_eq!(model.item(99), Some(990));
    assert_eq!(model.item(100), None);
}

#[test]
fn cap_change_fires_one_replacement() {
    let raw = Rc::new(VecModel::from_vec((0..50).collect::<Vec<u32>>()));
    let model = sampled(&raw, 10);
    let (seen, _subscription) = record(model.as_ref());

    model.set_max_items(20);
    model.set_max_items(20);
    model.set_max_items(0);

    assert_eq!(
        *seen.borrow(),
        vec![ItemsChanged::replace_all(10, 20), ItemsChanged::replace_all(20, 50)]
    );
    assert_eq!(model.n_items(), 50);
}

#[test]
fn upstream_change_fires_replacement() {
    let raw = Rc::new(VecModel::from_vec((0..5).collect::<Vec<u32>>()));
    let model = sampled(&raw, 4);
    let (seen, _subscription) = record(model.as_ref());

    raw.push(5);
    raw.splice(0, 6, std::iter::empty());

    assert_eq!(
        *seen.borrow(),
        vec![ItemsChanged::replace_all(4, 4), ItemsChanged::replace_all(4, 0)]
    );
}

#[test]
fn rebinding_swaps_sequences() {
    let first = Rc::new(VecModel::from_vec(vec![1, 2, 3]));
    let second = Rc::new(VecModel::from_vec(vec![4]));
    let model = sampled(&first, 0);
    let (seen, _subscription) = record(model.as_ref());

    let replacement: SharedModel<u32> = second.clone();
    model.set_model(Some(replacement));
    assert_eq!(*seen.borrow(), vec![ItemsChanged::replace_all(3, 1)]);
    assert_eq!(model.item(0), Some(4));

    model.set_model(None);
    assert_eq!(model.n_items(), 0);
    assert_eq!(model.source_position(0), None);
}
