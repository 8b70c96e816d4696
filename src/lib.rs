//! tablectx - A transactional table context for deferred, merged SQL execution
//!
//! Commands issued against a table are buffered and flushed as a single
//! round-trip when changes are saved, optionally inside a Serializable
//! transaction. The context owns its command executor and releases it
//! deterministically on dispose or drop.

pub mod config;
pub mod context;
pub mod core;
pub mod query;
pub mod storage;
pub mod transaction;
pub mod utils;
