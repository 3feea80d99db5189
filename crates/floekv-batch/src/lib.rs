//! Core batch runtime for FloeKV: the mutation batch, its entry model and
//! wire codec, save points, and the replay protocol.

// public exports are one module level down
pub mod batch;
pub mod codec;
pub mod entry;
pub mod error;
pub mod flags;
pub mod handler;
pub mod savepoint;

///
/// CONSTANTS
///

/// Byte length of the serialized batch header.
///
/// An 8-byte sequence-number placeholder followed by a little-endian u32
/// entry count. The sequence field is stamped by an engine at apply time;
/// the batch itself always writes it as zero.
pub const HEADER_SIZE: usize = 12;
