use crate::entry::EntryKind;

///
/// ContentFlags
///
/// Bitset summarizing which entry kinds are present anywhere in a batch.
/// Updated incrementally on every append so the `has_*` queries never scan
/// the entry stream. A bit, once set, is only cleared by `clear()` or a
/// rollback to a save point taken before the bit was set.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ContentFlags(u32);

impl ContentFlags {
    pub const EMPTY: Self = Self(0);

    pub const HAS_PUT: Self = Self(1);
    pub const HAS_DELETE: Self = Self(1 << 1);
    pub const HAS_SINGLE_DELETE: Self = Self(1 << 2);
    pub const HAS_DELETE_RANGE: Self = Self(1 << 3);
    pub const HAS_MERGE: Self = Self(1 << 4);
    pub const HAS_BEGIN_PREPARE: Self = Self(1 << 5);
    pub const HAS_END_PREPARE: Self = Self(1 << 6);
    pub const HAS_COMMIT: Self = Self(1 << 7);
    pub const HAS_ROLLBACK: Self = Self(1 << 8);
    pub const HAS_BLOB_INDEX: Self = Self(1 << 9);

    /// Return the flag bit contributed by one entry kind.
    ///
    /// Annotation-only kinds (`LogData`, `Noop`) contribute nothing; a
    /// timestamped commit counts as a commit.
    #[must_use]
    pub const fn for_kind(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Put => Self::HAS_PUT,
            EntryKind::Merge => Self::HAS_MERGE,
            EntryKind::Delete => Self::HAS_DELETE,
            EntryKind::SingleDelete => Self::HAS_SINGLE_DELETE,
            EntryKind::DeleteRange => Self::HAS_DELETE_RANGE,
            EntryKind::PutBlobIndex => Self::HAS_BLOB_INDEX,
            EntryKind::BeginPrepare => Self::HAS_BEGIN_PREPARE,
            EntryKind::EndPrepare => Self::HAS_END_PREPARE,
            EntryKind::Commit | EntryKind::CommitWithTimestamp => Self::HAS_COMMIT,
            EntryKind::Rollback => Self::HAS_ROLLBACK,
            EntryKind::LogData | EntryKind::Noop => Self::EMPTY,
        }
    }

    pub const fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}
