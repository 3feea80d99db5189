use crate::flags::ContentFlags;

///
/// SavePoint
///
/// Snapshot of batch serialized size, entry count, and content flags at a
/// point in time. Restoring a save point truncates the batch back to
/// exactly this state; its correctness is load-bearing for rollback, so it
/// has no behavior beyond field access and the cleared test.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SavePoint {
    size: usize,
    count: u32,
    content_flags: ContentFlags,
}

impl SavePoint {
    #[must_use]
    pub const fn new(size: usize, count: u32, content_flags: ContentFlags) -> Self {
        Self {
            size,
            count,
            content_flags,
        }
    }

    /// Serialized byte length of the batch when the snapshot was taken.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of logical entries when the snapshot was taken.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Content flags when the snapshot was taken.
    #[must_use]
    pub const fn content_flags(&self) -> ContentFlags {
        self.content_flags
    }

    /// Zero all fields.
    pub const fn clear(&mut self) {
        *self = Self {
            size: 0,
            count: 0,
            content_flags: ContentFlags::EMPTY,
        };
    }

    /// True iff all fields are zero.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.size == 0 && self.count == 0 && self.content_flags.is_empty()
    }
}
