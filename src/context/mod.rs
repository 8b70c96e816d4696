//! 表上下文模块
//!
//! 提供绑定到单张表的事务化访问上下文：
//! - 合并执行：缓冲多条命令，保存时一次往返提交
//! - 事务边界：保存修改时在 Serializable 事务中提交
//! - 资源释放：显式释放或析构时释放执行器
//!
//! ## 使用示例
//!
//! ```rust
//! use std::sync::Arc;
//! use tablectx::config::{DbConfig, DbRegistry};
//! use tablectx::context::TableContext;
//! use tablectx::query::Statement;
//! use tablectx::storage::MemoryDatabase;
//!
//! let db = MemoryDatabase::new();
//! let mut registry = DbRegistry::new(Arc::new(db.factory()));
//! registry.register(DbConfig::new("Data Source=app.db")).unwrap();
//!
//! let mut ctx = TableContext::from_default(&registry, Some("users")).unwrap();
//! ctx.insert(Statement::new("INSERT INTO users (name) VALUES ('a')")).unwrap();
//! ctx.insert(Statement::new("INSERT INTO users (name) VALUES ('b')")).unwrap();
//! assert_eq!(ctx.save_changes().unwrap(), 2);
//! ```

pub mod stats;
pub mod table_context;

pub use stats::ContextStats;
pub use table_context::{ConnectOptions, TableContext};
