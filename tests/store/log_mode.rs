//! Log-mode stores: timestamp keys, monotonic inserts, start-key lookup.

use crate::common::*;

#[test]
fn keys_come_from_payload_timestamps() {
    let t = TestStore::log();
    let id = t.insert(&log_entry(100, 3)).unwrap();
    assert_eq!(id, ts(100, 3));
    assert_eq!(LogTimestamp::from_record_id(id), LogTimestamp::new(100, 3));
}

#[test]
fn non_increasing_timestamp_rejected_without_mutation() {
    let t = TestStore::log();
    t.insert(&log_entry(5, 1)).unwrap();
    t.insert(&log_entry(5, 2)).unwrap();
    let before = t.store.data_size();

    for (secs, inc) in [(5, 2), (5, 1), (4, 9)] {
        let err = t.insert(&log_entry(secs, inc)).unwrap_err();
        assert!(err.is_value_range(), "{:?}", err);
        assert!(err.to_string().contains("ts not higher than highest"));
    }
    assert_eq!(t.ids(), vec![ts(5, 1), ts(5, 2)]);
    assert_eq!(t.store.data_size(), before);
}

#[test]
fn malformed_timestamps_rejected() {
    let t = TestStore::log();
    assert!(t.insert(b"short").unwrap_err().is_value_range());
    assert!(t.insert(&log_entry(0, 0)).unwrap_err().is_value_range());
    assert!(t
        .insert(&LogTimestamp::new(u32::MAX, 1).with_body(b"op"))
        .unwrap_err()
        .is_value_range());
    assert_eq!(t.store.num_records(), 0);
}

#[test]
fn start_key_lookup() {
    let t = TestStore::log();
    assert_eq!(t.store.log_start_key(ts(1, 1)), None);

    t.insert_all(&[log_entry(10, 1), log_entry(20, 1), log_entry(30, 1)]);
    assert_eq!(t.store.log_start_key(ts(5, 0)), Some(ts(10, 1)));
    assert_eq!(t.store.log_start_key(ts(20, 1)), Some(ts(20, 1)));
    assert_eq!(t.store.log_start_key(ts(25, 7)), Some(ts(20, 1)));
    assert_eq!(t.store.log_start_key(ts(99, 0)), Some(ts(30, 1)));
}

#[test]
fn start_key_unavailable_on_ordinary_store() {
    let t = TestStore::uncapped();
    t.insert(b"x").unwrap();
    assert_eq!(t.store.log_start_key(RecordId::MAX), None);
}

#[test]
fn capped_log_is_a_ring_buffer() {
    let t = TestStore::new("local.oplog.rs", StoreConfig::capped(1_000, Some(3)).with_log_mode(true));
    for secs in 1..=6 {
        t.insert(&log_entry(secs, 1)).unwrap();
    }
    assert_eq!(t.ids(), vec![ts(4, 1), ts(5, 1), ts(6, 1)]);

    // Resuming from an evicted point lands on the oldest survivor.
    assert_eq!(t.store.log_start_key(ts(2, 1)), Some(ts(4, 1)));
}

#[test]
fn rollback_to_point_then_append() {
    let t = TestStore::log();
    t.insert_all(&[log_entry(1, 1), log_entry(2, 1), log_entry(3, 1)]);

    let mut txn = t.manager.begin();
    t.store.capped_truncate_after(&mut txn, ts(1, 1), false);
    txn.commit().unwrap();

    // The highest key dropped, so an earlier timestamp is accepted again.
    t.insert(&log_entry(2, 5)).unwrap();
    assert_eq!(t.ids(), vec![ts(1, 1), ts(2, 5)]);
}

#[test]
fn abort_reopens_timestamp_space() {
    let t = TestStore::log();
    t.insert(&log_entry(1, 1)).unwrap();

    let mut txn = t.manager.begin();
    t.store.insert_record(&mut txn, &log_entry(9, 9)).unwrap();
    txn.abort().unwrap();

    t.insert(&log_entry(2, 1)).unwrap();
    assert_eq!(t.ids(), vec![ts(1, 1), ts(2, 1)]);
}
