//! 事务类型定义
//!
//! 提供命令执行器事务控制所需的核心类型

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 事务隔离级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    /// 最严格的隔离级别，合并提交默认使用
    Serializable,
    Snapshot,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::ReadUncommitted => write!(f, "READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => write!(f, "READ COMMITTED"),
            IsolationLevel::RepeatableRead => write!(f, "REPEATABLE READ"),
            IsolationLevel::Serializable => write!(f, "SERIALIZABLE"),
            IsolationLevel::Snapshot => write!(f, "SNAPSHOT"),
        }
    }
}

/// 执行器上的事务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionState {
    /// 没有事务
    #[default]
    NoTransaction,
    /// 事务已开启
    Open(IsolationLevel),
    /// 已提交，等待关闭释放
    Committed,
}

impl TransactionState {
    /// 是否持有事务资源（已开启或已提交未关闭）
    pub fn is_active(&self) -> bool {
        !matches!(self, TransactionState::NoTransaction)
    }

    /// 检查是否可以提交或回滚
    pub fn is_open(&self) -> bool {
        matches!(self, TransactionState::Open(_))
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::NoTransaction => write!(f, "NoTransaction"),
            TransactionState::Open(level) => write!(f, "Open({})", level),
            TransactionState::Committed => write!(f, "Committed"),
        }
    }
}

/// 事务错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    #[error("事务开始失败: {0}")]
    BeginFailed(String),

    #[error("事务提交失败: {0}")]
    CommitFailed(String),

    #[error("回滚失败: {0}")]
    RollbackFailed(String),

    #[error("没有活跃的事务")]
    NoActiveTransaction,

    #[error("事务已提交，只能关闭")]
    AlreadyCommitted,

    #[error("已有 {current} 事务，无法以 {requested} 重新开启")]
    IsolationMismatch {
        current: IsolationLevel,
        requested: IsolationLevel,
    },
}
