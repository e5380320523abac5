//! Capped collection behavior: bounds, eviction order, rejection.

use proptest::prelude::*;

use crate::common::*;

#[test]
fn worked_example_evicts_lowest_key() {
    let t = TestStore::capped(100, None);
    let key1 = t.insert(&bytes(60, 1)).unwrap();
    assert_eq!(t.store.data_size(), 60);

    let key2 = t.insert(&bytes(60, 2)).unwrap();
    assert!(key2 > key1);
    assert_eq!(t.ids(), vec![key2]);
    assert_eq!(t.store.data_size(), 60);
}

#[test]
fn oversize_insert_leaves_store_unchanged() {
    let t = TestStore::capped(100, None);
    let kept = t.insert(&bytes(50, 1)).unwrap();

    let err = t.insert(&bytes(101, 9)).unwrap_err();
    assert!(err.is_value_range());
    assert_eq!(t.ids(), vec![kept]);
    assert_eq!(t.store.data_size(), 50);
}

#[test]
fn count_bound_evicts_oldest_first() {
    let t = TestStore::capped(10_000, Some(3));
    let ids = t.insert_all(&[b"a", b"b", b"c", b"d", b"e"]);
    assert_eq!(t.ids(), ids[2..].to_vec());
    assert_eq!(t.store.num_records(), 3);
}

#[test]
fn capped_record_cannot_grow() {
    let t = TestStore::capped(100, None);
    let id = t.insert(b"four").unwrap();

    let mut txn = t.manager.begin();
    let err = t
        .store
        .update_record(&mut txn, id, b"longer", None)
        .unwrap_err();
    assert!(matches!(err, StoreError::CappedGrowth { .. }));
    t.store.update_record(&mut txn, id, b"two", None).unwrap();
    txn.commit().unwrap();

    assert_eq!(t.store.data_for(id).as_bytes(), b"two");
    assert_eq!(t.store.data_size(), 3);
}

#[test]
fn aborted_insert_restores_evicted_records() {
    let t = TestStore::capped(100, Some(2));
    let ids = t.insert_all(&[&bytes(40, 1), &bytes(40, 2)]);

    let mut txn = t.manager.begin();
    t.store.insert_record(&mut txn, &bytes(90, 3)).unwrap();
    assert_eq!(t.store.num_records(), 1);
    txn.abort().unwrap();

    assert_eq!(t.ids(), ids);
    assert_eq!(t.store.data_size(), 80);
}

#[test]
fn truncate_after_drops_newer_records() {
    let t = TestStore::capped(1_000, None);
    let ids = t.insert_all(&[b"1", b"2", b"3", b"4"]);

    let mut txn = t.manager.begin();
    t.store.capped_truncate_after(&mut txn, ids[1], false);
    assert_eq!(t.ids(), ids[..2].to_vec());
    t.store.capped_truncate_after(&mut txn, ids[1], true);
    assert_eq!(t.ids(), ids[..1].to_vec());
    txn.abort().unwrap();

    assert_eq!(t.ids(), ids);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bounds_hold_after_every_insert(
        lens in prop::collection::vec(0usize..80, 1..50),
        max_docs in prop::option::of(1u64..8),
    ) {
        let t = TestStore::capped(120, max_docs);
        let mut inserted = Vec::new();
        for len in lens {
            match t.insert(&bytes(len, 7)) {
                Ok(id) => inserted.push(id),
                Err(e) => prop_assert!(e.is_value_range()),
            }
            prop_assert!(t.store.data_size() <= 120);
            if let Some(max) = max_docs {
                prop_assert!(t.store.num_records() as u64 <= max);
            }
            // Survivors are always the newest suffix of what was inserted.
            let survivors = t.ids();
            prop_assert_eq!(&inserted[inserted.len() - survivors.len()..], &survivors[..]);
        }
    }
}
