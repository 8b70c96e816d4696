//! 查询模块
//!
//! 语句、待执行命令以及合并执行用的查询累加器

pub mod accumulator;
pub mod statement;

pub use accumulator::{MergeQueue, QueryAccumulator};
pub use statement::{CommandKind, Param, PendingCommand, Statement};
