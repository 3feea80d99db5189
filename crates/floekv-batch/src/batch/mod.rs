#[cfg(test)]
mod tests;

use crate::{
    HEADER_SIZE, codec,
    entry::{Entry, PartitionId},
    error::BatchError,
    flags::ContentFlags,
    handler::Handler,
    savepoint::SavePoint,
};

///
/// MutationBatch
///
/// An ordered, appendable log of key-value mutations and transactional
/// markers, applied atomically by a storage engine. The serialized wire
/// representation is the batch state: appends encode straight into the
/// buffer, `data()` borrows it, and rollback is byte truncation, so
/// `data_size()` equals the serialized length by construction.
///
/// Read-only operations take `&self` and are safe to call from multiple
/// threads; any mutating operation takes `&mut self`, so the single-writer
/// contract is enforced by the borrow checker rather than internal locking.
///

#[derive(Clone, Debug)]
pub struct MutationBatch {
    rep: Vec<u8>,
    count: u32,
    content_flags: ContentFlags,
    save_points: Vec<SavePoint>,
    wal_term_point: SavePoint,
    max_bytes: Option<usize>,
}

impl Default for MutationBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationBatch {
    /// Construct an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Construct an empty batch with `reserved_bytes` of buffer capacity
    /// pre-allocated.
    #[must_use]
    pub fn with_capacity(reserved_bytes: usize) -> Self {
        let mut rep = Vec::with_capacity(reserved_bytes.max(HEADER_SIZE));
        codec::write_header(&mut rep);

        Self {
            rep,
            count: 0,
            content_flags: ContentFlags::EMPTY,
            save_points: Vec::new(),
            wal_term_point: SavePoint::default(),
            max_bytes: None,
        }
    }

    /// Reconstruct a batch from a serialized representation, as returned by
    /// [`data`](Self::data).
    ///
    /// The full entry stream is decoded and checked against the header
    /// count; any malformed input fails with a corruption error. The
    /// sequence field is preserved verbatim so round trips are byte-exact.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BatchError> {
        if bytes.len() < HEADER_SIZE {
            return Err(BatchError::corrupt(format!(
                "batch shorter than header: {} bytes",
                bytes.len()
            )));
        }

        let declared = codec::header_count(bytes);
        let mut cursor = &bytes[HEADER_SIZE..];
        let mut count = 0u32;
        let mut content_flags = ContentFlags::EMPTY;

        while !cursor.is_empty() {
            let entry = codec::decode_entry(&mut cursor)?;
            count = count.wrapping_add(1);
            content_flags.insert(ContentFlags::for_kind(entry.kind()));
        }

        if count != declared {
            return Err(BatchError::corrupt(format!(
                "header count {declared} does not match {count} decoded entries"
            )));
        }

        Ok(Self {
            rep: bytes.to_vec(),
            count,
            content_flags,
            save_points: Vec::new(),
            wal_term_point: SavePoint::default(),
            max_bytes: None,
        })
    }

    /// Cap the serialized size of this batch. Appends that would grow
    /// `data_size` past the cap fail with `CapacityExceeded`.
    pub const fn set_max_bytes(&mut self, max_bytes: usize) {
        self.max_bytes = Some(max_bytes);
    }

    //
    // Appends
    //

    /// Append a put of `key` → `value`.
    pub fn put(
        &mut self,
        partition: Option<PartitionId>,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), BatchError> {
        self.append(&Entry::Put {
            partition,
            key,
            value,
        })
    }

    /// Append a merge of `value` into `key`, resolved by the engine's merge
    /// operator at apply time.
    pub fn merge(
        &mut self,
        partition: Option<PartitionId>,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), BatchError> {
        self.append(&Entry::Merge {
            partition,
            key,
            value,
        })
    }

    /// Append a delete of `key`.
    pub fn delete(&mut self, partition: Option<PartitionId>, key: &[u8]) -> Result<(), BatchError> {
        self.append(&Entry::Delete { partition, key })
    }

    /// Append a single-delete of `key` (removes the most recent version
    /// only; the engine defines the exact semantics).
    pub fn single_delete(
        &mut self,
        partition: Option<PartitionId>,
        key: &[u8],
    ) -> Result<(), BatchError> {
        self.append(&Entry::SingleDelete { partition, key })
    }

    /// Append a range delete covering the half-open range
    /// `[begin_key, end_key)`. The range is not expanded into individual
    /// deletes; consumers interpret the marker.
    pub fn delete_range(
        &mut self,
        partition: Option<PartitionId>,
        begin_key: &[u8],
        end_key: &[u8],
    ) -> Result<(), BatchError> {
        self.append(&Entry::DeleteRange {
            partition,
            begin_key,
            end_key,
        })
    }

    /// Append an out-of-band annotation. Not interpreted as a key mutation;
    /// surfaced to iteration as `LogData` only.
    pub fn put_log_data(&mut self, blob: &[u8]) -> Result<(), BatchError> {
        self.append(&Entry::LogData { blob })
    }

    /// Append a blob-index put for engines with a separate blob file layer.
    pub fn put_blob_index(
        &mut self,
        partition: PartitionId,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), BatchError> {
        self.append(&Entry::PutBlobIndex {
            partition,
            key,
            value,
        })
    }

    //
    // Two-phase-commit markers
    //

    /// Mark the start of a prepare section.
    pub fn mark_begin_prepare(&mut self) -> Result<(), BatchError> {
        self.append(&Entry::BeginPrepare)
    }

    /// Mark the end of a prepare section for transaction `xid`.
    pub fn mark_end_prepare(&mut self, xid: &[u8]) -> Result<(), BatchError> {
        self.append(&Entry::EndPrepare { xid })
    }

    /// Mark a commit of the prepared transaction `xid`.
    pub fn mark_commit(&mut self, xid: &[u8]) -> Result<(), BatchError> {
        self.append(&Entry::Commit { xid })
    }

    /// Mark a commit of the prepared transaction `xid` at `timestamp`.
    pub fn mark_commit_with_timestamp(
        &mut self,
        xid: &[u8],
        timestamp: &[u8],
    ) -> Result<(), BatchError> {
        self.append(&Entry::CommitWithTimestamp { xid, timestamp })
    }

    /// Mark a rollback of the prepared transaction `xid`.
    pub fn mark_rollback(&mut self, xid: &[u8]) -> Result<(), BatchError> {
        self.append(&Entry::Rollback { xid })
    }

    /// Append a padding record that carries no mutation.
    pub fn mark_noop(&mut self, empty_batch: bool) -> Result<(), BatchError> {
        self.append(&Entry::Noop { empty_batch })
    }

    //
    // WAL termination point
    //

    /// Mark the current state as the last prefix eligible for write-ahead
    /// logging; entries appended afterwards are applied but not logged.
    /// Re-marking overwrites: the last call wins.
    pub fn mark_wal_termination_point(&mut self) {
        self.wal_term_point = self.state_save_point();
    }

    /// The last-marked WAL termination point, or a cleared save point if
    /// never marked.
    #[must_use]
    pub const fn wal_termination_point(&self) -> SavePoint {
        self.wal_term_point
    }

    /// Clone of this batch truncated to the WAL termination point, with a
    /// corrected header count. This is what an engine writes to its WAL.
    /// Returns a full clone when no termination point is marked. Save
    /// points and the size cap do not carry over to the derived batch.
    #[must_use]
    pub fn wal_batch(&self) -> Self {
        if self.wal_term_point.is_cleared() {
            let mut full = self.clone();
            full.save_points = Vec::new();
            full.max_bytes = None;

            return full;
        }

        let mut rep = self.rep[..self.wal_term_point.size()].to_vec();
        codec::set_header_count(&mut rep, self.wal_term_point.count());

        Self {
            rep,
            count: self.wal_term_point.count(),
            content_flags: self.wal_term_point.content_flags(),
            save_points: Vec::new(),
            wal_term_point: SavePoint::default(),
            max_bytes: None,
        }
    }

    //
    // Save points
    //

    /// Push the current state onto the save-point stack.
    pub fn set_save_point(&mut self) {
        self.save_points.push(self.state_save_point());
    }

    /// Pop the top save point and truncate the batch back to it, restoring
    /// count, data size, and content flags to the captured values.
    pub fn rollback_to_save_point(&mut self) -> Result<(), BatchError> {
        let Some(save_point) = self.save_points.pop() else {
            return Err(BatchError::illegal_state("no save point to roll back to"));
        };

        self.rep.truncate(save_point.size());
        self.count = save_point.count();
        codec::set_header_count(&mut self.rep, self.count);
        self.content_flags = save_point.content_flags();

        // A rollback landing strictly before the WAL termination point
        // invalidates the marked prefix.
        if self.wal_term_point.size() > save_point.size() {
            self.wal_term_point.clear();
        }

        Ok(())
    }

    /// Discard the top save point without rolling back.
    pub fn pop_save_point(&mut self) -> Result<(), BatchError> {
        if self.save_points.pop().is_none() {
            return Err(BatchError::illegal_state("no save point to pop"));
        }

        Ok(())
    }

    /// Empty the batch: drop all entries, reset count, data size, and
    /// content flags to zero, and clear the save-point stack and the WAL
    /// termination point.
    pub fn clear(&mut self) {
        self.rep.clear();
        codec::write_header(&mut self.rep);
        self.count = 0;
        self.content_flags = ContentFlags::EMPTY;
        self.save_points.clear();
        self.wal_term_point.clear();
    }

    //
    // Read-only surface
    //

    /// The exact serialized encoding of the batch, parseable back via
    /// [`from_bytes`](Self::from_bytes).
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.rep
    }

    /// Byte length of the serialized form (header included).
    #[must_use]
    pub const fn data_size(&self) -> usize {
        self.rep.len()
    }

    /// Number of logical entries.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Content flags accumulated across all appends.
    #[must_use]
    pub const fn content_flags(&self) -> ContentFlags {
        self.content_flags
    }

    /// Replay every entry in insertion order, dispatching each to
    /// `handler`. Iteration halts early without error when the handler's
    /// `should_continue` reports false; a handler error aborts iteration
    /// and propagates.
    pub fn iterate<H>(&self, handler: &mut H) -> Result<(), BatchError>
    where
        H: Handler + ?Sized,
    {
        let mut cursor = &self.rep[HEADER_SIZE..];

        while !cursor.is_empty() {
            let entry = codec::decode_entry(&mut cursor)?;
            handler.handle(entry)?;

            if !handler.should_continue() {
                break;
            }
        }

        Ok(())
    }

    //
    // Content-flag queries, all O(1)
    //

    /// True iff at least one put exists anywhere in the batch.
    #[must_use]
    pub const fn has_put(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_PUT)
    }

    /// True iff at least one delete exists anywhere in the batch.
    #[must_use]
    pub const fn has_delete(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_DELETE)
    }

    /// True iff at least one single-delete exists anywhere in the batch.
    #[must_use]
    pub const fn has_single_delete(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_SINGLE_DELETE)
    }

    /// True iff at least one range delete exists anywhere in the batch.
    #[must_use]
    pub const fn has_delete_range(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_DELETE_RANGE)
    }

    /// True iff at least one merge exists anywhere in the batch.
    #[must_use]
    pub const fn has_merge(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_MERGE)
    }

    /// True iff a begin-prepare marker exists anywhere in the batch.
    #[must_use]
    pub const fn has_begin_prepare(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_BEGIN_PREPARE)
    }

    /// True iff an end-prepare marker exists anywhere in the batch.
    #[must_use]
    pub const fn has_end_prepare(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_END_PREPARE)
    }

    /// True iff a commit marker (timestamped or not) exists anywhere in
    /// the batch.
    #[must_use]
    pub const fn has_commit(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_COMMIT)
    }

    /// True iff a rollback marker exists anywhere in the batch.
    #[must_use]
    pub const fn has_rollback(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_ROLLBACK)
    }

    /// True iff at least one blob-index put exists anywhere in the batch.
    #[must_use]
    pub const fn has_blob_index(&self) -> bool {
        self.content_flags.contains(ContentFlags::HAS_BLOB_INDEX)
    }

    //
    // Internals
    //

    const fn state_save_point(&self) -> SavePoint {
        SavePoint::new(self.rep.len(), self.count, self.content_flags)
    }

    /// Append one entry, updating count, data size, and content flags
    /// together. The encoded length is computed and checked against the
    /// wire-format bound and the size cap before any byte is written, so a
    /// rejected append leaves no partial state behind.
    fn append(&mut self, entry: &Entry<'_>) -> Result<(), BatchError> {
        let len = codec::encoded_len(entry);

        if len > codec::MAX_ENTRY_BYTES {
            return Err(BatchError::EntryTooLarge {
                len,
                limit: codec::MAX_ENTRY_BYTES,
            });
        }

        if let Some(max_bytes) = self.max_bytes
            && self.rep.len() + len > max_bytes
        {
            return Err(BatchError::CapacityExceeded { len, max_bytes });
        }

        codec::encode_entry(&mut self.rep, entry);
        self.count = self.count.wrapping_add(1);
        codec::set_header_count(&mut self.rep, self.count);
        self.content_flags.insert(ContentFlags::for_kind(entry.kind()));

        Ok(())
    }
}
