//! Collaborator hooks, byte patches, validation and statistics.

use std::sync::{Arc, Mutex};

use recstore::{CappedEvictionCallback, RecordData, StoreResult, ValidateAdaptor};

use crate::common::*;

/// Eviction callback that records what it saw and can veto one id
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<RecordId>>,
    veto: Option<RecordId>,
}

impl CappedEvictionCallback for Recorder {
    fn about_to_delete_capped(&self, id: RecordId, _data: &RecordData) -> StoreResult<()> {
        if self.veto == Some(id) {
            return Err(StoreError::vetoed("index still building"));
        }
        self.seen.lock().unwrap().push(id);
        Ok(())
    }
}

#[test]
fn eviction_callback_sees_each_victim_in_key_order() {
    let mut t = TestStore::capped(1_000, Some(2));
    let recorder = Arc::new(Recorder::default());
    t.store
        .set_capped_callback(Some(recorder.clone() as Arc<dyn CappedEvictionCallback>));

    let ids = t.insert_all(&[b"a", b"b", b"c", b"d"]);
    assert_eq!(*recorder.seen.lock().unwrap(), vec![ids[0], ids[1]]);
}

#[test]
fn eviction_veto_keeps_earlier_evictions() {
    let t = TestStore::capped(1_000, Some(4));
    let ids = t.insert_all(&[b"a", b"b", b"c", b"d"]);
    let recorder = Arc::new(Recorder {
        veto: Some(ids[1]),
        ..Default::default()
    });

    // A second handle with a tighter bound over the same block.
    let mut tight = RecordStore::with_shared_state(
        "test.capped",
        t.store.shared_state(),
        StoreConfig::capped(1_000, Some(1)),
    )
    .unwrap();
    tight.set_capped_callback(Some(recorder.clone()));

    let mut txn = t.manager.begin();
    let err = tight.insert_record(&mut txn, b"e").unwrap_err();
    assert!(err.is_veto());
    // ids[0] went before the veto; the insert itself stays applied.
    assert_eq!(t.ids().len(), 4);
    assert!(t.store.find_record(ids[0]).is_none());
    assert_eq!(txn.pending_changes().inserts, 1);
    assert_eq!(txn.pending_changes().removes, 1);

    txn.abort().unwrap();
    assert_eq!(t.ids(), ids);
}

#[test]
fn update_notifier_can_veto() {
    let t = TestStore::uncapped();
    let id = t.insert(b"before").unwrap();

    let veto = |_: RecordId| -> StoreResult<()> { Err(StoreError::vetoed("document locked")) };
    let allow = |_: RecordId| -> StoreResult<()> { Ok(()) };

    let mut txn = t.manager.begin();
    let err = t
        .store
        .update_record(&mut txn, id, b"after", Some(&veto))
        .unwrap_err();
    assert!(err.is_veto());
    assert_eq!(txn.change_count(), 0);
    assert_eq!(t.store.data_for(id).as_bytes(), b"before");

    t.store
        .update_record(&mut txn, id, b"after", Some(&allow))
        .unwrap();
    txn.commit().unwrap();
    assert_eq!(t.store.data_for(id).as_bytes(), b"after");
    assert_eq!(t.store.data_size(), 5);
}

#[test]
fn damages_patch_in_place() {
    let t = TestStore::capped(100, None);
    let id = t.insert(b"hello world").unwrap();

    let mut txn = t.manager.begin();
    let patched = t
        .store
        .update_with_damages(
            &mut txn,
            id,
            b"WORLDHELLO",
            &[DamageEvent::new(5, 0, 5), DamageEvent::new(0, 6, 5)],
        )
        .unwrap();
    assert_eq!(patched.as_bytes(), b"HELLO WORLD");
    assert_eq!(t.store.data_size(), 11);

    let err = t
        .store
        .update_with_damages(&mut txn, id, b"xx", &[DamageEvent::new(0, 10, 2)])
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPatch { index: 0, .. }));
    assert_eq!(txn.change_count(), 1);

    txn.abort().unwrap();
    assert_eq!(t.store.data_for(id).as_bytes(), b"hello world");
}

#[test]
fn validate_collects_every_bad_record() {
    let t = TestStore::uncapped();
    t.insert_all(&[&b"ok"[..], &b""[..], &b"fine"[..], &b""[..]]);

    let adaptor = |_: RecordId, data: &RecordData| -> StoreResult<usize> {
        if data.is_empty() {
            Err(StoreError::corruption("empty document"))
        } else {
            Ok(data.len())
        }
    };

    let shallow = t.store.validate(false, &adaptor);
    assert!(shallow.valid);
    assert_eq!(shallow.num_records, 4);

    let full = t.store.validate(true, &adaptor as &dyn ValidateAdaptor);
    assert!(!full.valid);
    assert_eq!(full.errors.len(), 2);
    assert_eq!(full.num_records, 4);
}

#[test]
fn stats_report_bounds_and_sizes() {
    let t = TestStore::capped(4096, Some(10));
    t.insert_all(&[bytes(10, 1), bytes(20, 2)]);

    assert_eq!(t.store.name(), "InMemory");
    assert_eq!(t.store.data_size(), 30);
    assert_eq!(
        t.store.storage_size(),
        30 + 2 * recstore::RECORD_OVERHEAD_BYTES
    );

    let stats = t.store.custom_stats(1024.0);
    assert!(stats.capped);
    assert_eq!(stats.max, Some(10));
    assert_eq!(stats.max_size, Some(4.0));
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["maxSize"], serde_json::json!(4.0));

    let touch = t.store.touch();
    assert_eq!(serde_json::to_value(touch).unwrap()["numRanges"], 1);

    let uncapped = TestStore::uncapped().store.custom_stats(1.0);
    assert!(!uncapped.capped);
    assert_eq!(serde_json::to_value(&uncapped).unwrap(), serde_json::json!({ "capped": false }));
}
