use crate::{BitSlicedBitmap, Error, Strategy as Algorithm, words_for};
use proptest::prelude::*;
use std::vec::Vec;

const MAX_DEPTH: usize = 12;
const MAX_SIZE: u64 = 600;

fn low_bits(value: u64, depth: usize) -> u64 {
    if depth >= 64 {
        value
    } else {
        value & ((1u64 << depth) - 1)
    }
}

/// A bitmap of random shape whose planes are already filled with noise, the
/// way a long-lived version would look.
fn arb_bitmap() -> impl Strategy<Value = BitSlicedBitmap> {
    (0..=MAX_DEPTH, 1..=MAX_SIZE).prop_flat_map(|(depth, size)| {
        let words = (depth + 1) * words_for(size) as usize;
        proptest::collection::vec(any::<u64>(), words).prop_map(move |noise| {
            let mut bm = BitSlicedBitmap::new(depth, size).unwrap();
            let stride = bm.word_count();
            for j in 0..=depth {
                bm.plane_mut(j)
                    .copy_from_slice(&noise[j * stride..(j + 1) * stride]);
            }
            bm
        })
    })
}

fn arb_case() -> impl Strategy<Value = (BitSlicedBitmap, Vec<(u64, u64)>)> {
    arb_bitmap().prop_flat_map(|bm| {
        let size = bm.size();
        let pairs = proptest::collection::vec((0..size, any::<u64>()), 0..256);
        (Just(bm), pairs)
    })
}

fn unzip(pairs: &[(u64, u64)]) -> (Vec<u64>, Vec<u64>) {
    pairs.iter().copied().unzip()
}

fn sorted(pairs: &[(u64, u64)]) -> Vec<(u64, u64)> {
    let mut pairs = pairs.to_vec();
    pairs.sort_by_key(|&(id, _)| id);
    pairs
}

/// Plain per-slot model of what a splat is supposed to produce.
fn model_after(bm: &BitSlicedBitmap, pairs: &[(u64, u64)]) -> Vec<Option<u64>> {
    let mut model: Vec<Option<u64>> = (0..bm.size()).map(|id| bm.get(id)).collect();
    for &(id, value) in pairs {
        model[id as usize] = Some(low_bits(value, bm.depth()));
    }
    model
}

proptest! {
    #[test]
    fn naive_matches_batched_on_sorted_ids((bm, pairs) in arb_case()) {
        let (ids, values) = unzip(&sorted(&pairs));
        let naive = bm.splat_naive(&ids, &values).unwrap();
        let batched = bm.splat_batched(&ids, &values).unwrap();
        for j in 0..=bm.depth() {
            prop_assert_eq!(naive.plane(j), batched.plane(j), "plane {} differs", j);
        }
        prop_assert_eq!(naive, batched);
    }

    #[test]
    fn sorted_batched_matches_naive_in_any_order((bm, pairs) in arb_case()) {
        let (ids, values) = unzip(&pairs);
        let naive = bm.splat_naive(&ids, &values).unwrap();
        let sorted = bm.splat(Algorithm::SortedBatched, &ids, &values).unwrap();
        prop_assert_eq!(naive, sorted);
    }

    #[test]
    fn splat_matches_model((bm, pairs) in arb_case()) {
        let (ids, values) = unzip(&pairs);
        let model = model_after(&bm, &pairs);
        for algorithm in [Algorithm::Naive, Algorithm::SortedBatched] {
            let next = bm.splat(algorithm, &ids, &values).unwrap();
            let actual: Vec<Option<u64>> = (0..bm.size()).map(|id| next.get(id)).collect();
            prop_assert_eq!(&actual, &model, "{:?}", algorithm);
        }
    }

    #[test]
    fn splat_is_idempotent((bm, pairs) in arb_case()) {
        let (ids, values) = unzip(&sorted(&pairs));
        for algorithm in [Algorithm::Naive, Algorithm::Batched] {
            let once = bm.splat(algorithm, &ids, &values).unwrap();
            let twice = once.splat(algorithm, &ids, &values).unwrap();
            prop_assert_eq!(&once, &twice);
        }
    }

    #[test]
    fn values_are_truncated((bm, pairs) in arb_case()) {
        let (ids, values) = unzip(&sorted(&pairs));
        let next = bm.splat_batched(&ids, &values).unwrap();
        prop_assert_eq!(next.words().len(), bm.words().len());
        for &id in &ids {
            let stored = next.get(id).unwrap();
            prop_assert_eq!(low_bits(stored, bm.depth()), stored);
        }
    }

    #[test]
    fn splatted_ids_exist((bm, pairs) in arb_case()) {
        let (ids, values) = unzip(&pairs);
        let next = bm.splat_naive(&ids, &values).unwrap();
        for &id in &ids {
            prop_assert!(next.contains(id));
        }
    }

    #[test]
    fn receiver_is_never_modified((bm, pairs) in arb_case()) {
        let before = bm.clone();
        let (ids, values) = unzip(&pairs);
        let sorted_pairs = sorted(&pairs);
        let (sorted_ids, sorted_values) = unzip(&sorted_pairs);
        let _ = bm.splat_naive(&ids, &values).unwrap();
        let _ = bm.splat_batched(&sorted_ids, &sorted_values).unwrap();
        let _ = bm.splat(Algorithm::SortedBatched, &ids, &values).unwrap();
        prop_assert_eq!(bm, before);
    }

    #[test]
    fn empty_batch_is_identity(bm in arb_bitmap()) {
        for algorithm in [Algorithm::Naive, Algorithm::Batched, Algorithm::SortedBatched] {
            let next = bm.splat(algorithm, &[], &[]).unwrap();
            prop_assert_eq!(&next, &bm);
        }
    }

    #[test]
    fn batched_rejects_exactly_descending_words((bm, pairs) in arb_case()) {
        let (ids, values) = unzip(&pairs);
        let first_break = ids
            .windows(2)
            .position(|w| w[1] / 64 < w[0] / 64)
            .map(|i| i + 1);
        match (bm.splat_batched(&ids, &values), first_break) {
            (Ok(batched), None) => {
                prop_assert_eq!(batched, bm.splat_naive(&ids, &values).unwrap());
            }
            (Err(Error::PreconditionViolation { index, previous, id }), Some(expected)) => {
                prop_assert_eq!(index, expected);
                prop_assert_eq!(previous, ids[index - 1]);
                prop_assert_eq!(id, ids[index]);
            }
            (result, expected) => {
                prop_assert!(false, "unexpected {:?} for break at {:?}", result.map(|_| ()), expected);
            }
        }
    }

    #[test]
    fn out_of_range_rejected_before_any_work(
        (bm, pairs) in arb_case(),
        excess in 0u64..1000,
    ) {
        let (mut ids, mut values) = unzip(&sorted(&pairs));
        ids.push(bm.size() + excess);
        values.push(0);
        for algorithm in [Algorithm::Naive, Algorithm::Batched, Algorithm::SortedBatched] {
            prop_assert_eq!(
                bm.splat(algorithm, &ids, &values),
                Err(Error::OutOfRange { id: bm.size() + excess, size: bm.size() })
            );
        }
    }
}
