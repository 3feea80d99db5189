
use crate::{
    HEADER_SIZE,
    entry::{Entry, PartitionId},
    error::BatchError,
};
use bytes::BufMut;

///
/// Batch wire codec
///
/// Layout: a 12-byte header (8-byte sequence-number placeholder, then a
/// little-endian u32 entry count), followed by entries in insertion order.
/// Each entry is one tag byte, a little-endian u32 partition id for the
/// partition-qualified tags only, then u32-length-prefixed byte strings.
///
/// Partition-qualified variants use distinct tags rather than a sentinel
/// id, so a default-partition put and a put into partition 0 stay
/// distinguishable across a round trip.
///

const COUNT_OFFSET: usize = 8;

/// Upper bound on one entry's encoded length.
///
/// Byte strings are u32-length-prefixed, so any entry at or under this
/// bound has every field's prefix fit the wire format.
pub(crate) const MAX_ENTRY_BYTES: usize = u32::MAX as usize;

const TAG_NOOP: u8 = 0;
const TAG_PUT: u8 = 1;
const TAG_PARTITION_PUT: u8 = 2;
const TAG_MERGE: u8 = 3;
const TAG_PARTITION_MERGE: u8 = 4;
const TAG_DELETE: u8 = 5;
const TAG_PARTITION_DELETE: u8 = 6;
const TAG_SINGLE_DELETE: u8 = 7;
const TAG_PARTITION_SINGLE_DELETE: u8 = 8;
const TAG_DELETE_RANGE: u8 = 9;
const TAG_PARTITION_DELETE_RANGE: u8 = 10;
const TAG_LOG_DATA: u8 = 11;
const TAG_BLOB_INDEX: u8 = 12;
const TAG_BEGIN_PREPARE: u8 = 13;
const TAG_END_PREPARE: u8 = 14;
const TAG_COMMIT: u8 = 15;
const TAG_COMMIT_WITH_TIMESTAMP: u8 = 16;
const TAG_ROLLBACK: u8 = 17;

/// Append a zeroed header to an empty buffer.
pub(crate) fn write_header(buf: &mut Vec<u8>) {
    buf.put_bytes(0, HEADER_SIZE);
}

/// Read the entry count from a serialized batch header.
///
/// Callers must have verified the buffer covers the header.
pub(crate) fn header_count(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([
        bytes[COUNT_OFFSET],
        bytes[COUNT_OFFSET + 1],
        bytes[COUNT_OFFSET + 2],
        bytes[COUNT_OFFSET + 3],
    ])
}

/// Rewrite the entry count in a serialized batch header.
pub(crate) fn set_header_count(bytes: &mut [u8], count: u32) {
    bytes[COUNT_OFFSET..COUNT_OFFSET + 4].copy_from_slice(&count.to_le_bytes());
}

/// Exact encoded byte length of one entry.
///
/// Computed before encoding so a capacity rejection can happen without a
/// partial write.
pub(crate) fn encoded_len(entry: &Entry<'_>) -> usize {
    const TAG: usize = 1;
    const PARTITION: usize = 4;
    const LEN_PREFIX: usize = 4;

    match entry {
        Entry::Put {
            partition,
            key,
            value,
        }
        | Entry::Merge {
            partition,
            key,
            value,
        } => {
            TAG + partition.map_or(0, |_| PARTITION)
                + LEN_PREFIX
                + key.len()
                + LEN_PREFIX
                + value.len()
        }
        Entry::Delete { partition, key } | Entry::SingleDelete { partition, key } => {
            TAG + partition.map_or(0, |_| PARTITION) + LEN_PREFIX + key.len()
        }
        Entry::DeleteRange {
            partition,
            begin_key,
            end_key,
        } => {
            TAG + partition.map_or(0, |_| PARTITION)
                + LEN_PREFIX
                + begin_key.len()
                + LEN_PREFIX
                + end_key.len()
        }
        Entry::LogData { blob } => TAG + LEN_PREFIX + blob.len(),
        Entry::PutBlobIndex { key, value, .. } => {
            TAG + PARTITION + LEN_PREFIX + key.len() + LEN_PREFIX + value.len()
        }
        Entry::BeginPrepare => TAG,
        Entry::EndPrepare { xid } | Entry::Commit { xid } | Entry::Rollback { xid } => {
            TAG + LEN_PREFIX + xid.len()
        }
        Entry::CommitWithTimestamp { xid, timestamp } => {
            TAG + LEN_PREFIX + xid.len() + LEN_PREFIX + timestamp.len()
        }
        Entry::Noop { .. } => TAG + 1,
    }
}

/// Encode one entry onto the end of a batch buffer.
pub(crate) fn encode_entry(buf: &mut Vec<u8>, entry: &Entry<'_>) {
    match entry {
        Entry::Put {
            partition,
            key,
            value,
        } => {
            put_tag(buf, *partition, TAG_PUT, TAG_PARTITION_PUT);
            put_len_prefixed(buf, key);
            put_len_prefixed(buf, value);
        }
        Entry::Merge {
            partition,
            key,
            value,
        } => {
            put_tag(buf, *partition, TAG_MERGE, TAG_PARTITION_MERGE);
            put_len_prefixed(buf, key);
            put_len_prefixed(buf, value);
        }
        Entry::Delete { partition, key } => {
            put_tag(buf, *partition, TAG_DELETE, TAG_PARTITION_DELETE);
            put_len_prefixed(buf, key);
        }
        Entry::SingleDelete { partition, key } => {
            put_tag(buf, *partition, TAG_SINGLE_DELETE, TAG_PARTITION_SINGLE_DELETE);
            put_len_prefixed(buf, key);
        }
        Entry::DeleteRange {
            partition,
            begin_key,
            end_key,
        } => {
            put_tag(buf, *partition, TAG_DELETE_RANGE, TAG_PARTITION_DELETE_RANGE);
            put_len_prefixed(buf, begin_key);
            put_len_prefixed(buf, end_key);
        }
        Entry::LogData { blob } => {
            buf.put_u8(TAG_LOG_DATA);
            put_len_prefixed(buf, blob);
        }
        Entry::PutBlobIndex {
            partition,
            key,
            value,
        } => {
            buf.put_u8(TAG_BLOB_INDEX);
            buf.put_u32_le(partition.get());
            put_len_prefixed(buf, key);
            put_len_prefixed(buf, value);
        }
        Entry::BeginPrepare => buf.put_u8(TAG_BEGIN_PREPARE),
        Entry::EndPrepare { xid } => {
            buf.put_u8(TAG_END_PREPARE);
            put_len_prefixed(buf, xid);
        }
        Entry::Commit { xid } => {
            buf.put_u8(TAG_COMMIT);
            put_len_prefixed(buf, xid);
        }
        Entry::CommitWithTimestamp { xid, timestamp } => {
            buf.put_u8(TAG_COMMIT_WITH_TIMESTAMP);
            put_len_prefixed(buf, xid);
            put_len_prefixed(buf, timestamp);
        }
        Entry::Rollback { xid } => {
            buf.put_u8(TAG_ROLLBACK);
            put_len_prefixed(buf, xid);
        }
        Entry::Noop { empty_batch } => {
            buf.put_u8(TAG_NOOP);
            buf.put_u8(u8::from(*empty_batch));
        }
    }
}

/// Decode one entry from the front of `buf`, advancing it past the entry.
pub(crate) fn decode_entry<'a>(buf: &mut &'a [u8]) -> Result<Entry<'a>, BatchError> {
    let tag = read_u8(buf, "entry tag")?;

    let entry = match tag {
        TAG_PUT | TAG_PARTITION_PUT => Entry::Put {
            partition: read_partition(buf, tag == TAG_PARTITION_PUT)?,
            key: read_len_prefixed(buf, "put key")?,
            value: read_len_prefixed(buf, "put value")?,
        },
        TAG_MERGE | TAG_PARTITION_MERGE => Entry::Merge {
            partition: read_partition(buf, tag == TAG_PARTITION_MERGE)?,
            key: read_len_prefixed(buf, "merge key")?,
            value: read_len_prefixed(buf, "merge value")?,
        },
        TAG_DELETE | TAG_PARTITION_DELETE => Entry::Delete {
            partition: read_partition(buf, tag == TAG_PARTITION_DELETE)?,
            key: read_len_prefixed(buf, "delete key")?,
        },
        TAG_SINGLE_DELETE | TAG_PARTITION_SINGLE_DELETE => Entry::SingleDelete {
            partition: read_partition(buf, tag == TAG_PARTITION_SINGLE_DELETE)?,
            key: read_len_prefixed(buf, "single-delete key")?,
        },
        TAG_DELETE_RANGE | TAG_PARTITION_DELETE_RANGE => Entry::DeleteRange {
            partition: read_partition(buf, tag == TAG_PARTITION_DELETE_RANGE)?,
            begin_key: read_len_prefixed(buf, "delete-range begin key")?,
            end_key: read_len_prefixed(buf, "delete-range end key")?,
        },
        TAG_LOG_DATA => Entry::LogData {
            blob: read_len_prefixed(buf, "log-data blob")?,
        },
        TAG_BLOB_INDEX => Entry::PutBlobIndex {
            partition: PartitionId::new(read_u32(buf, "blob-index partition id")?),
            key: read_len_prefixed(buf, "blob-index key")?,
            value: read_len_prefixed(buf, "blob-index value")?,
        },
        TAG_BEGIN_PREPARE => Entry::BeginPrepare,
        TAG_END_PREPARE => Entry::EndPrepare {
            xid: read_len_prefixed(buf, "end-prepare xid")?,
        },
        TAG_COMMIT => Entry::Commit {
            xid: read_len_prefixed(buf, "commit xid")?,
        },
        TAG_COMMIT_WITH_TIMESTAMP => Entry::CommitWithTimestamp {
            xid: read_len_prefixed(buf, "commit xid")?,
            timestamp: read_len_prefixed(buf, "commit timestamp")?,
        },
        TAG_ROLLBACK => Entry::Rollback {
            xid: read_len_prefixed(buf, "rollback xid")?,
        },
        TAG_NOOP => Entry::Noop {
            empty_batch: read_u8(buf, "noop flag")? != 0,
        },
        _ => {
            return Err(BatchError::corrupt(format!("unknown entry tag: {tag}")));
        }
    };

    Ok(entry)
}

fn put_tag(buf: &mut Vec<u8>, partition: Option<PartitionId>, plain: u8, qualified: u8) {
    match partition {
        Some(id) => {
            buf.put_u8(qualified);
            buf.put_u32_le(id.get());
        }
        None => buf.put_u8(plain),
    }
}

// Appends reject entries over MAX_ENTRY_BYTES before encoding, so the
// prefix always fits.
#[allow(clippy::cast_possible_truncation)]
fn put_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    debug_assert!(bytes.len() <= MAX_ENTRY_BYTES);

    buf.put_u32_le(bytes.len() as u32);
    buf.put_slice(bytes);
}

fn read_partition(buf: &mut &[u8], qualified: bool) -> Result<Option<PartitionId>, BatchError> {
    if qualified {
        Ok(Some(PartitionId::new(read_u32(buf, "partition id")?)))
    } else {
        Ok(None)
    }
}

fn split_to<'a>(
    buf: &mut &'a [u8],
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], BatchError> {
    let source = *buf;
    if source.len() < len {
        return Err(BatchError::corrupt(format!(
            "truncated {what}: need {len} bytes, have {}",
            source.len()
        )));
    }
    let (head, tail) = source.split_at(len);
    *buf = tail;

    Ok(head)
}

fn read_u8(buf: &mut &[u8], what: &'static str) -> Result<u8, BatchError> {
    Ok(split_to(buf, 1, what)?[0])
}

fn read_u32(buf: &mut &[u8], what: &'static str) -> Result<u32, BatchError> {
    let bytes = split_to(buf, 4, what)?;

    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_len_prefixed<'a>(buf: &mut &'a [u8], what: &'static str) -> Result<&'a [u8], BatchError> {
    let len = read_u32(buf, what)? as usize;
    split_to(buf, len, what)
}
