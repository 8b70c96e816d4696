//! 集成测试共享工具模块
//!
//! 提供记录调用顺序的 Mock 执行器以及注册表构建辅助函数

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use tablectx::config::{DbConfig, DbRegistry};
use tablectx::core::{DBError, DBResult, DataBaseType};
use tablectx::query::Statement;
use tablectx::storage::{CommandExecutor, MemoryDatabase};
use tablectx::transaction::{IsolationLevel, TransactionError, TransactionState};

/// Mock 执行器记录的调用
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorCall {
    OpenTransaction(IsolationLevel),
    CloseTransaction,
    Commit,
    Rollback,
    Execute(String),
    Batch(Vec<String>),
    Dispose,
}

/// 可注入的失败点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorFailures {
    pub open: bool,
    pub batch: bool,
    pub commit: bool,
    pub rollback: bool,
}

/// 记录调用顺序的 Mock 执行器
///
/// 调用记录保存在共享句柄中，执行器移交给上下文之后仍可观察
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<ExecutorCall>>>,
    failures: ExecutorFailures,
    state: TransactionState,
    rows_per_statement: u64,
    disposed: bool,
}

impl RecordingExecutor {
    pub fn new() -> (Self, Arc<Mutex<Vec<ExecutorCall>>>) {
        Self::with_failures(ExecutorFailures::default())
    }

    pub fn with_failures(failures: ExecutorFailures) -> (Self, Arc<Mutex<Vec<ExecutorCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let executor = Self {
            calls: calls.clone(),
            failures,
            state: TransactionState::NoTransaction,
            rows_per_statement: 1,
            disposed: false,
        };
        (executor, calls)
    }

    /// 以已开启的事务作为初始状态
    pub fn with_open_transaction(mut self) -> Self {
        self.state = TransactionState::Open(IsolationLevel::ReadCommitted);
        self
    }

    fn record(&self, call: ExecutorCall) {
        self.calls.lock().push(call);
    }

    fn ensure_alive(&self) -> DBResult<()> {
        if self.disposed {
            return Err(DBError::Disposed);
        }
        Ok(())
    }
}

impl CommandExecutor for RecordingExecutor {
    fn data_type(&self) -> DataBaseType {
        DataBaseType::SQLite
    }

    fn command_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    fn transaction_state(&self) -> TransactionState {
        self.state
    }

    fn open_transaction(&mut self, isolation: IsolationLevel) -> DBResult<()> {
        self.ensure_alive()?;
        self.record(ExecutorCall::OpenTransaction(isolation));
        if self.failures.open {
            return Err(TransactionError::BeginFailed("mock".to_string()).into());
        }
        self.state = TransactionState::Open(isolation);
        Ok(())
    }

    fn commit(&mut self) -> DBResult<()> {
        self.ensure_alive()?;
        self.record(ExecutorCall::Commit);
        if self.failures.commit {
            return Err(TransactionError::CommitFailed("mock".to_string()).into());
        }
        self.state = TransactionState::Committed;
        Ok(())
    }

    fn rollback(&mut self) -> DBResult<()> {
        self.ensure_alive()?;
        self.record(ExecutorCall::Rollback);
        self.state = TransactionState::NoTransaction;
        if self.failures.rollback {
            return Err(TransactionError::RollbackFailed("mock".to_string()).into());
        }
        Ok(())
    }

    fn close_transaction(&mut self) -> DBResult<()> {
        self.ensure_alive()?;
        self.record(ExecutorCall::CloseTransaction);
        self.state = TransactionState::NoTransaction;
        Ok(())
    }

    fn execute_non_query(&mut self, statement: &Statement) -> DBResult<u64> {
        self.ensure_alive()?;
        self.record(ExecutorCall::Execute(statement.sql.clone()));
        Ok(self.rows_per_statement)
    }

    fn execute_batch(&mut self, statements: &[Statement]) -> DBResult<u64> {
        self.ensure_alive()?;
        self.record(ExecutorCall::Batch(
            statements.iter().map(|s| s.sql.clone()).collect(),
        ));
        if self.failures.batch {
            return Err(DBError::Execution("constraint violation".to_string()));
        }
        Ok(self.rows_per_statement * statements.len() as u64)
    }

    fn dispose(&mut self) -> DBResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.record(ExecutorCall::Dispose);
        self.disposed = true;
        self.state = TransactionState::NoTransaction;
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// 创建索引 0 指向内存数据库的注册表
pub fn create_test_registry(db: &MemoryDatabase, data_type: DataBaseType) -> DbRegistry {
    let mut registry = DbRegistry::new(Arc::new(db.factory()));
    registry
        .register(DbConfig::new("Data Source=test.db;Mode=Memory").with_data_type(data_type))
        .expect("注册数据库配置失败");
    registry
}

/// 复制一份调用记录
pub fn snapshot(calls: &Arc<Mutex<Vec<ExecutorCall>>>) -> Vec<ExecutorCall> {
    calls.lock().clone()
}
