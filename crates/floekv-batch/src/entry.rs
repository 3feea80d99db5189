use derive_more::Display;
use std::fmt;

///
/// PartitionId
///
/// Identifier of a named partition (column family) within one storage
/// instance. Id 0 is the default partition; batch operations that take
/// `Option<PartitionId>` treat `None` as the default partition.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PartitionId(u32);

impl PartitionId {
    pub const DEFAULT: Self = Self(0);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

///
/// Entry
///
/// One logical record in a mutation batch, borrowing its byte fields from
/// the batch's serialized buffer. Insertion order is the semantic order.
///
/// `DeleteRange` covers the half-open key range `[begin_key, end_key)`.
/// `LogData` is an out-of-band annotation, never interpreted as a key
/// mutation. The prepare/commit/rollback markers scope two-phase-commit
/// sections for engines that execute them.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entry<'a> {
    Put {
        partition: Option<PartitionId>,
        key: &'a [u8],
        value: &'a [u8],
    },
    Merge {
        partition: Option<PartitionId>,
        key: &'a [u8],
        value: &'a [u8],
    },
    Delete {
        partition: Option<PartitionId>,
        key: &'a [u8],
    },
    SingleDelete {
        partition: Option<PartitionId>,
        key: &'a [u8],
    },
    DeleteRange {
        partition: Option<PartitionId>,
        begin_key: &'a [u8],
        end_key: &'a [u8],
    },
    LogData {
        blob: &'a [u8],
    },
    PutBlobIndex {
        partition: PartitionId,
        key: &'a [u8],
        value: &'a [u8],
    },
    BeginPrepare,
    EndPrepare {
        xid: &'a [u8],
    },
    Commit {
        xid: &'a [u8],
    },
    CommitWithTimestamp {
        xid: &'a [u8],
        timestamp: &'a [u8],
    },
    Rollback {
        xid: &'a [u8],
    },
    Noop {
        empty_batch: bool,
    },
}

impl Entry<'_> {
    /// Return the discriminant of this entry.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Put { .. } => EntryKind::Put,
            Self::Merge { .. } => EntryKind::Merge,
            Self::Delete { .. } => EntryKind::Delete,
            Self::SingleDelete { .. } => EntryKind::SingleDelete,
            Self::DeleteRange { .. } => EntryKind::DeleteRange,
            Self::LogData { .. } => EntryKind::LogData,
            Self::PutBlobIndex { .. } => EntryKind::PutBlobIndex,
            Self::BeginPrepare => EntryKind::BeginPrepare,
            Self::EndPrepare { .. } => EntryKind::EndPrepare,
            Self::Commit { .. } => EntryKind::Commit,
            Self::CommitWithTimestamp { .. } => EntryKind::CommitWithTimestamp,
            Self::Rollback { .. } => EntryKind::Rollback,
            Self::Noop { .. } => EntryKind::Noop,
        }
    }
}

///
/// EntryKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntryKind {
    Put,
    Merge,
    Delete,
    SingleDelete,
    DeleteRange,
    LogData,
    PutBlobIndex,
    BeginPrepare,
    EndPrepare,
    Commit,
    CommitWithTimestamp,
    Rollback,
    Noop,
}

impl EntryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Merge => "merge",
            Self::Delete => "delete",
            Self::SingleDelete => "single_delete",
            Self::DeleteRange => "delete_range",
            Self::LogData => "log_data",
            Self::PutBlobIndex => "put_blob_index",
            Self::BeginPrepare => "begin_prepare",
            Self::EndPrepare => "end_prepare",
            Self::Commit => "commit",
            Self::CommitWithTimestamp => "commit_with_timestamp",
            Self::Rollback => "rollback",
            Self::Noop => "noop",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
