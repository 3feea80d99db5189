//! FloeKV — atomic write-batch construction, replay, and save-point
//! rollback for embedded key-value engines.
//!
//! ## Crate layout
//! - `batch`: the mutation batch, entry model, wire codec, save points,
//!   and the replay protocol.
//! - `engine`: the storage-engine collaborator trait, a reference
//!   in-memory engine, and merge operators.
//!
//! The `prelude` module mirrors the surface used by batch producers.

pub use floekv_batch as batch;
pub use floekv_engine as engine;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, codecs, or helpers are re-exported here.
///

pub mod prelude {
    pub use floekv_batch::{
        batch::MutationBatch,
        entry::{Entry, EntryKind, PartitionId},
        handler::Handler,
        savepoint::SavePoint,
    };
    pub use floekv_engine::{
        engine::StorageEngine,
        memory::MemoryEngine,
        merge::{MergeOperator, Uint64AddOperator},
    };
}
