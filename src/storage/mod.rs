//! 存储访问层
//!
//! - `connection`：驱动层会话与连接工厂
//! - `executor`：命令执行器，负责事务控制与语句执行
//! - `memory_storage`：可记录调用、可注入故障的内存驱动

pub mod connection;
pub mod executor;
pub mod memory_storage;

pub use connection::{Connection, ConnectionDescriptor, ConnectionFactory};
pub use executor::{CommandExecutor, DbExecutor, ExecutorId};
pub use memory_storage::{
    FailPoint, JournalEntry, MemoryConnection, MemoryConnectionFactory, MemoryDatabase,
};
