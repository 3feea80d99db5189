
use super::*;
use crate::{
    entry::EntryKind,
    error::BatchErrorKind,
    handler::{Handler, HandlerError},
};

///
/// RecordingHandler
///
/// Records the dispatched entry kinds plus a rendered form of every entry,
/// so tests can compare full callback sequences across round trips.
///

#[derive(Debug, Default)]
struct RecordingHandler {
    kinds: Vec<EntryKind>,
    rendered: Vec<String>,
    stop_after: Option<usize>,
}

impl Handler for RecordingHandler {
    fn handle(&mut self, entry: Entry<'_>) -> Result<(), HandlerError> {
        self.kinds.push(entry.kind());
        self.rendered.push(format!("{entry:?}"));

        Ok(())
    }

    fn should_continue(&self) -> bool {
        match self.stop_after {
            Some(limit) => self.kinds.len() < limit,
            None => true,
        }
    }
}

fn replay(batch: &MutationBatch) -> RecordingHandler {
    let mut handler = RecordingHandler::default();
    batch.iterate(&mut handler).unwrap();

    handler
}

fn batch_with_every_kind() -> MutationBatch {
    let mut batch = MutationBatch::new();
    batch.put(None, b"k", b"v").unwrap();
    batch
        .put(Some(PartitionId::new(4)), b"k", b"v2")
        .unwrap();
    batch.merge(None, b"counter", &2u64.to_le_bytes()).unwrap();
    batch.delete(Some(PartitionId::new(4)), b"k").unwrap();
    batch.single_delete(None, b"once").unwrap();
    batch.delete_range(None, b"a", b"m").unwrap();
    batch.put_log_data(b"annotation").unwrap();
    batch
        .put_blob_index(PartitionId::new(9), b"k", b"blobref")
        .unwrap();
    batch.mark_begin_prepare().unwrap();
    batch.mark_end_prepare(b"xid").unwrap();
    batch.mark_commit(b"xid").unwrap();
    batch.mark_commit_with_timestamp(b"xid2", b"\x09").unwrap();
    batch.mark_rollback(b"xid3").unwrap();
    batch.mark_noop(false).unwrap();

    batch
}

#[test]
fn empty_batch_is_header_only() {
    let batch = MutationBatch::new();

    assert_eq!(batch.data_size(), HEADER_SIZE);
    assert_eq!(batch.count(), 0);
    assert!(batch.is_empty());
    assert!(batch.content_flags().is_empty());
    assert!(replay(&batch).kinds.is_empty());
}

#[test]
fn appends_iterate_in_insertion_order() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"key", b"v1").unwrap();
    batch.delete(None, b"key").unwrap();
    batch.put(None, b"key", b"v2").unwrap();
    batch.put(None, b"key", b"v3").unwrap();

    let handler = replay(&batch);
    assert_eq!(
        handler.kinds,
        vec![
            EntryKind::Put,
            EntryKind::Delete,
            EntryKind::Put,
            EntryKind::Put
        ]
    );
    assert_eq!(batch.count(), 4);
    assert!(batch.has_put());
    assert!(batch.has_delete());
    assert!(!batch.has_merge());
}

#[test]
fn data_size_tracks_serialized_length() {
    let mut batch = MutationBatch::new();
    assert_eq!(batch.data_size(), batch.data().len());

    batch.put(None, b"key", b"value").unwrap();
    assert_eq!(batch.data_size(), batch.data().len());

    batch.delete_range(Some(PartitionId::new(1)), b"a", b"z").unwrap();
    assert_eq!(batch.data_size(), batch.data().len());
}

#[test]
fn round_trip_preserves_bytes_count_flags_and_callbacks() {
    let batch = batch_with_every_kind();
    let parsed = MutationBatch::from_bytes(batch.data()).unwrap();

    assert_eq!(parsed.data(), batch.data());
    assert_eq!(parsed.count(), batch.count());
    assert_eq!(parsed.content_flags(), batch.content_flags());
    assert_eq!(replay(&parsed).rendered, replay(&batch).rendered);
}

#[test]
fn content_flags_cover_every_flagged_kind() {
    let batch = batch_with_every_kind();

    assert!(batch.has_put());
    assert!(batch.has_merge());
    assert!(batch.has_delete());
    assert!(batch.has_single_delete());
    assert!(batch.has_delete_range());
    assert!(batch.has_blob_index());
    assert!(batch.has_begin_prepare());
    assert!(batch.has_end_prepare());
    assert!(batch.has_commit());
    assert!(batch.has_rollback());
}

#[test]
fn timestamped_commit_counts_as_commit() {
    let mut batch = MutationBatch::new();
    batch.mark_commit_with_timestamp(b"xid", b"\x01").unwrap();

    assert!(batch.has_commit());
}

#[test]
fn log_data_and_noop_set_no_flags() {
    let mut batch = MutationBatch::new();
    batch.put_log_data(b"blob").unwrap();
    batch.mark_noop(true).unwrap();

    assert_eq!(batch.count(), 2);
    assert!(batch.content_flags().is_empty());
}

#[test]
fn save_point_rollback_restores_captured_state() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.put(None, b"b", b"2").unwrap();

    let captured = batch.data().to_vec();
    let captured_flags = batch.content_flags();
    batch.set_save_point();

    batch.delete(None, b"a").unwrap();
    batch.merge(None, b"c", b"3").unwrap();
    batch.put(None, b"d", b"4").unwrap();

    batch.rollback_to_save_point().unwrap();

    assert_eq!(batch.count(), 2);
    assert_eq!(batch.data(), captured.as_slice());
    assert_eq!(batch.data_size(), captured.len());
    assert_eq!(batch.content_flags(), captured_flags);
    assert!(!batch.has_delete());
    assert!(!batch.has_merge());
}

#[test]
fn save_points_nest_lifo() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.set_save_point();

    batch.put(None, b"b", b"2").unwrap();
    let two_entries = batch.data().to_vec();
    batch.set_save_point();

    batch.put(None, b"c", b"3").unwrap();

    batch.rollback_to_save_point().unwrap();
    assert_eq!(batch.data(), two_entries.as_slice());
    assert_eq!(batch.count(), 2);

    batch.rollback_to_save_point().unwrap();
    assert_eq!(batch.count(), 1);
}

#[test]
fn pop_save_point_discards_without_rollback() {
    let mut batch = MutationBatch::new();
    batch.set_save_point();
    batch.put(None, b"a", b"1").unwrap();

    batch.pop_save_point().unwrap();
    assert_eq!(batch.count(), 1);

    let err = batch.rollback_to_save_point().unwrap_err();
    assert_eq!(err.kind(), BatchErrorKind::IllegalState);
}

#[test]
fn save_point_underflow_is_illegal_state() {
    let mut batch = MutationBatch::new();

    assert_eq!(
        batch.rollback_to_save_point().unwrap_err().kind(),
        BatchErrorKind::IllegalState
    );
    assert_eq!(
        batch.pop_save_point().unwrap_err().kind(),
        BatchErrorKind::IllegalState
    );
}

#[test]
fn clear_resets_everything() {
    let mut batch = batch_with_every_kind();
    batch.set_save_point();
    batch.mark_wal_termination_point();

    batch.clear();

    assert_eq!(batch.count(), 0);
    assert_eq!(batch.data_size(), HEADER_SIZE);
    assert!(batch.content_flags().is_empty());
    assert!(batch.wal_termination_point().is_cleared());
    assert_eq!(
        batch.rollback_to_save_point().unwrap_err().kind(),
        BatchErrorKind::IllegalState
    );
}

#[test]
fn capacity_violation_leaves_batch_unchanged() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.set_max_bytes(batch.data_size() + 4);

    let before = batch.data().to_vec();
    let before_flags = batch.content_flags();

    let err = batch.delete(None, b"some-longer-key").unwrap_err();
    assert_eq!(err.kind(), BatchErrorKind::CapacityExceeded);

    assert_eq!(batch.data(), before.as_slice());
    assert_eq!(batch.count(), 1);
    assert_eq!(batch.content_flags(), before_flags);
    assert!(!batch.has_delete());
}

#[test]
fn appends_under_the_cap_still_succeed() {
    let mut batch = MutationBatch::new();
    batch.set_max_bytes(256);

    batch.put(None, b"a", b"1").unwrap();
    batch.delete(None, b"a").unwrap();
    assert_eq!(batch.count(), 2);
}

#[test]
fn wal_termination_point_marks_the_durable_prefix() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.put(None, b"b", b"2").unwrap();

    let at_mark = batch.data().to_vec();
    batch.mark_wal_termination_point();

    batch.put(None, b"c", b"3").unwrap();
    batch.delete(None, b"a").unwrap();
    batch.put(None, b"d", b"4").unwrap();

    let term = batch.wal_termination_point();
    assert_eq!(term.count(), 2);
    assert_eq!(term.size(), at_mark.len());

    let wal = batch.wal_batch();
    assert_eq!(wal.count(), 2);
    assert_eq!(wal.data(), at_mark.as_slice());
    assert!(!wal.has_delete());

    // The derived prefix parses on its own.
    let reparsed = MutationBatch::from_bytes(wal.data()).unwrap();
    assert_eq!(replay(&reparsed).kinds.len(), 2);
}

#[test]
fn unmarked_wal_batch_is_the_full_batch() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();

    assert!(batch.wal_termination_point().is_cleared());
    assert_eq!(batch.wal_batch().data(), batch.data());
}

#[test]
fn remarking_wal_termination_point_overwrites() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.mark_wal_termination_point();

    batch.put(None, b"b", b"2").unwrap();
    batch.mark_wal_termination_point();

    assert_eq!(batch.wal_termination_point().count(), 2);
}

#[test]
fn rollback_crossing_wal_termination_point_clears_it() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.set_save_point();

    batch.put(None, b"b", b"2").unwrap();
    batch.mark_wal_termination_point();

    batch.rollback_to_save_point().unwrap();
    assert!(batch.wal_termination_point().is_cleared());
}

#[test]
fn rollback_behind_wal_termination_point_keeps_it() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.mark_wal_termination_point();

    batch.set_save_point();
    batch.put(None, b"b", b"2").unwrap();
    batch.rollback_to_save_point().unwrap();

    assert_eq!(batch.wal_termination_point().count(), 1);
}

#[test]
fn iteration_halts_when_handler_stops_continuing() {
    let batch = batch_with_every_kind();

    let mut handler = RecordingHandler {
        stop_after: Some(3),
        ..RecordingHandler::default()
    };
    batch.iterate(&mut handler).unwrap();

    assert_eq!(handler.kinds.len(), 3);
}

#[test]
fn handler_error_aborts_iteration_and_preserves_cause() {
    struct FailingHandler {
        seen: usize,
    }

    impl Handler for FailingHandler {
        fn handle(&mut self, _entry: Entry<'_>) -> Result<(), HandlerError> {
            self.seen += 1;
            if self.seen == 2 {
                return Err(HandlerError::with_source(
                    "replay rejected",
                    std::io::Error::other("disk full"),
                ));
            }

            Ok(())
        }
    }

    let mut batch = MutationBatch::new();
    batch.put(None, b"a", b"1").unwrap();
    batch.put(None, b"b", b"2").unwrap();
    batch.put(None, b"c", b"3").unwrap();

    let mut handler = FailingHandler { seen: 0 };
    let err = batch.iterate(&mut handler).unwrap_err();

    assert_eq!(err.kind(), BatchErrorKind::Handler);
    assert_eq!(handler.seen, 2, "iteration must stop at the failing entry");

    let BatchError::Handler(cause) = err else {
        panic!("expected handler error, got {err:?}");
    };
    assert_eq!(cause.message(), "replay rejected");
    assert!(std::error::Error::source(&cause).is_some());
}

#[test]
fn from_bytes_rejects_short_input() {
    let err = MutationBatch::from_bytes(&[0u8; 4]).unwrap_err();
    assert_eq!(err.kind(), BatchErrorKind::Corrupt);
}

#[test]
fn from_bytes_rejects_unknown_tag() {
    let mut bytes = MutationBatch::new().data().to_vec();
    bytes.push(0xEE);
    codec::set_header_count(&mut bytes, 1);

    let err = MutationBatch::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), BatchErrorKind::Corrupt);
}

#[test]
fn from_bytes_rejects_truncated_entry() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"key", b"value").unwrap();

    let bytes = batch.data();
    let err = MutationBatch::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err.kind(), BatchErrorKind::Corrupt);
}

#[test]
fn from_bytes_rejects_count_mismatch() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"key", b"value").unwrap();

    let mut bytes = batch.data().to_vec();
    codec::set_header_count(&mut bytes, 2);

    let err = MutationBatch::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), BatchErrorKind::Corrupt);
    assert!(err.to_string().contains("header count"), "got: {err}");
}

#[test]
fn from_bytes_preserves_foreign_sequence_numbers() {
    let mut batch = MutationBatch::new();
    batch.put(None, b"k", b"v").unwrap();

    // An engine stamped a sequence number into the header.
    let mut bytes = batch.data().to_vec();
    bytes[..8].copy_from_slice(&99u64.to_le_bytes());

    let parsed = MutationBatch::from_bytes(&bytes).unwrap();
    assert_eq!(parsed.data(), bytes.as_slice());
}

#[test]
fn reserved_capacity_does_not_change_contents() {
    let plain = MutationBatch::new();
    let reserved = MutationBatch::with_capacity(4096);

    assert_eq!(plain.data(), reserved.data());
}
