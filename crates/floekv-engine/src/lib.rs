//! Storage-engine collaborator surface for FloeKV batches: the engine
//! trait, a reference in-memory engine, and merge operators.

// public exports are one module level down
pub mod engine;
pub mod memory;
pub mod merge;
