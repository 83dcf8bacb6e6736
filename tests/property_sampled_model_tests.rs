use std::rc::Rc;

use proptest::prelude::*;
use trace_projection::model::{ListModel, SampledModel, SharedModel, VecModel};

proptest! {
    #[test]
    fn exposed_len_is_capped(real_len in 0usize..5_000, max_items in 1usize..3_000) {
        let raw: SharedModel<usize> = Rc::new(VecModel::from_vec((0..real_len).collect()));
        let model = SampledModel::new(Some(raw), max_items);
        prop_assert_eq!(model.n_items(), real_len.min(max_items));
    }

    #[test]
    fn short_sequences_map_identically(real_len in 0usize..500, extra in 0usize..500) {
        let raw: SharedModel<usize> = Rc::new(VecModel::from_vec((0..real_len).collect()));
        let model = SampledModel::new(Some(raw), real_len + extra + 1);
        for i in 0..real_len {
            prop_assert_eq!(model.item(i), Some(i));
        }
    }

    #[test]
    fn long_sequences_map_monotonically_across_the_range(
        max_items in 1usize..500,
        factor in 1usize..20,
        extra in 1usize..50
    ) {
        let real_len = max_items * factor + extra;
        let raw: SharedModel<usize> = Rc::new(VecModel::from_vec((0..real_len).collect()));
        let model = SampledModel::new(Some(raw), max_items);
        prop_assert_eq!(model.n_items(), max_items);

        let mapped: Vec<usize> = (0..max_items).filter_map(|d| model.item(d)).collect();
        prop_assert_eq!(mapped.len(), max_items);
        prop_assert_eq!(mapped[0], 0);
        prop_assert!(mapped.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert!(mapped.iter().all(|&source| source < real_len));

        let stride = real_len.div_ceil(max_items);
        prop_assert!(mapped.windows(2).all(|pair| pair[1] - pair[0] <= stride + 1));
        prop_assert!(real_len - 1 - mapped[max_items - 1] <= stride);
    }
}
