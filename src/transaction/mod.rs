//! 事务模块
//!
//! 定义命令执行器的事务状态、隔离级别以及事务错误。
//! 事务的开启、提交与关闭由 [`crate::storage::CommandExecutor`] 负责，
//! 表上下文在保存修改时驱动这些操作。

pub mod types;

pub use types::*;
