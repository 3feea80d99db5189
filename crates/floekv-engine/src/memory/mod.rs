
use crate::{
    engine::{ApplyError, StorageEngine},
    merge::MergeOperator,
};
use floekv_batch::{
    batch::MutationBatch,
    entry::{Entry, PartitionId},
    handler::{Handler, HandlerError},
};
use log::{debug, trace};
use std::{collections::BTreeMap, ops::Bound};

type Memtable = BTreeMap<Vec<u8>, Vec<u8>>;

///
/// MemoryEngine
///
/// Reference storage engine backed by one in-memory memtable per
/// partition, with an in-memory WAL holding the durable prefix of every
/// applied batch. Exists to exercise the batch contract end to end; it is
/// not a durable store.
///
/// Two-phase-commit markers and blob-index puts are refused with
/// `Unsupported`: this engine has no prepared-transaction registry or
/// blob file layer, and dropping the markers silently would mask caller
/// bugs.
///

#[derive(Default)]
pub struct MemoryEngine {
    partitions: BTreeMap<PartitionId, Memtable>,
    wal: Vec<Vec<u8>>,
    merge_operator: Option<Box<dyn MergeOperator>>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an engine that resolves merge entries with `operator`.
    /// Without one, batches containing merges are refused.
    #[must_use]
    pub fn with_merge_operator(operator: impl MergeOperator + 'static) -> Self {
        Self {
            partitions: BTreeMap::new(),
            wal: Vec::new(),
            merge_operator: Some(Box::new(operator)),
        }
    }

    /// Current value of `key`, if any. `None` partition reads the default
    /// partition.
    #[must_use]
    pub fn get(&self, partition: Option<PartitionId>, key: &[u8]) -> Option<&[u8]> {
        self.partitions
            .get(&partition.unwrap_or(PartitionId::DEFAULT))
            .and_then(|memtable| memtable.get(key))
            .map(Vec::as_slice)
    }

    /// Number of live keys in one partition.
    #[must_use]
    pub fn partition_len(&self, partition: Option<PartitionId>) -> usize {
        self.partitions
            .get(&partition.unwrap_or(PartitionId::DEFAULT))
            .map_or(0, BTreeMap::len)
    }

    /// Serialized durable prefixes of every applied batch, in apply order.
    #[must_use]
    pub fn wal(&self) -> &[Vec<u8>] {
        &self.wal
    }
}

impl StorageEngine for MemoryEngine {
    /// Parse and apply a serialized batch as one indivisible unit.
    ///
    /// Entries are replayed against a staged copy of the memtables; the
    /// copy only replaces the visible state after every entry applied, so
    /// a failure midway leaves the engine untouched.
    fn apply_atomically(&mut self, serialized: &[u8]) -> Result<(), ApplyError> {
        let batch = MutationBatch::from_bytes(serialized).map_err(ApplyError::Corrupt)?;

        let mut staged = self.partitions.clone();
        let outcome = {
            let mut applier = Applier {
                partitions: &mut staged,
                merge_operator: self.merge_operator.as_deref(),
                fatal: None,
            };

            match batch.iterate(&mut applier) {
                Ok(()) => Ok(()),
                Err(err) => Err(applier
                    .fatal
                    .take()
                    .map_or(ApplyError::Corrupt(err), |fatal| fatal)),
            }
        };
        outcome?;

        let wal_record = batch.wal_batch();
        debug!(
            "applied batch: {} entries, {} wal bytes",
            batch.count(),
            wal_record.data_size()
        );

        self.partitions = staged;
        self.wal.push(wal_record.data().to_vec());

        Ok(())
    }
}

///
/// Applier
///
/// Replay handler bridging batch iteration onto the staged memtables.
/// Typed failures are stashed so the caller can surface an `ApplyError`
/// instead of its stringly handler wrapping.
///

struct Applier<'a> {
    partitions: &'a mut BTreeMap<PartitionId, Memtable>,
    merge_operator: Option<&'a dyn MergeOperator>,
    fatal: Option<ApplyError>,
}

impl Applier<'_> {
    fn memtable(&mut self, partition: Option<PartitionId>) -> &mut Memtable {
        self.partitions
            .entry(partition.unwrap_or(PartitionId::DEFAULT))
            .or_default()
    }

    fn apply_entry(&mut self, entry: Entry<'_>) -> Result<(), ApplyError> {
        trace!("replaying {} entry", entry.kind());

        match entry {
            Entry::Put {
                partition,
                key,
                value,
            } => {
                self.memtable(partition).insert(key.to_vec(), value.to_vec());
            }
            Entry::Merge {
                partition,
                key,
                value,
            } => {
                let Some(operator) = self.merge_operator else {
                    return Err(ApplyError::Unsupported { kind: entry.kind() });
                };

                let memtable = self.memtable(partition);
                let existing = memtable.get(key).map(Vec::as_slice);
                let merged = operator.full_merge(existing, value)?;
                memtable.insert(key.to_vec(), merged);
            }
            Entry::Delete { partition, key } | Entry::SingleDelete { partition, key } => {
                self.memtable(partition).remove(key);
            }
            Entry::DeleteRange {
                partition,
                begin_key,
                end_key,
            } => {
                // Half-open range; inverted bounds touch nothing.
                if begin_key < end_key {
                    let memtable = self.memtable(partition);
                    let doomed: Vec<Vec<u8>> = memtable
                        .range::<[u8], _>((Bound::Included(begin_key), Bound::Excluded(end_key)))
                        .map(|(key, _)| key.clone())
                        .collect();

                    for key in doomed {
                        memtable.remove(&key);
                    }
                }
            }
            Entry::LogData { .. } | Entry::Noop { .. } => {}
            Entry::PutBlobIndex { .. }
            | Entry::BeginPrepare
            | Entry::EndPrepare { .. }
            | Entry::Commit { .. }
            | Entry::CommitWithTimestamp { .. }
            | Entry::Rollback { .. } => {
                return Err(ApplyError::Unsupported { kind: entry.kind() });
            }
        }

        Ok(())
    }
}

impl Handler for Applier<'_> {
    fn handle(&mut self, entry: Entry<'_>) -> Result<(), HandlerError> {
        match self.apply_entry(entry) {
            Ok(()) => Ok(()),
            Err(err) => {
                let message = err.to_string();
                self.fatal = Some(err);

                Err(HandlerError::new(message))
            }
        }
    }
}
