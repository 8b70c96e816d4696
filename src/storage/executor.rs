//! 命令执行器
//!
//! 持有一个数据库会话及其可选的事务，向表上下文暴露事务控制与执行操作

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::core::{ConfigError, DBError, DBResult, DataBaseType};
use crate::query::Statement;
use crate::storage::connection::{Connection, ConnectionDescriptor, ConnectionFactory};
use crate::transaction::{IsolationLevel, TransactionError, TransactionState};

/// 执行器ID
pub type ExecutorId = u64;

static EXECUTOR_ID_GENERATOR: AtomicU64 = AtomicU64::new(1);

/// 命令执行器
///
/// 同一时刻只归属一个表上下文，不支持多线程并发使用
pub trait CommandExecutor: Send {
    fn data_type(&self) -> DataBaseType;

    fn command_timeout(&self) -> Duration;

    fn transaction_state(&self) -> TransactionState;

    /// 开启事务
    ///
    /// 已有相同隔离级别的事务时保持不变；隔离级别不同时返回
    /// [`TransactionError::IsolationMismatch`]，原事务不受影响
    fn open_transaction(&mut self, isolation: IsolationLevel) -> DBResult<()>;

    /// 提交当前事务，之后仍需调用 `close_transaction` 释放
    fn commit(&mut self) -> DBResult<()>;

    /// 回滚当前事务
    fn rollback(&mut self) -> DBResult<()>;

    /// 关闭事务；未提交的事务会被丢弃，没有事务时什么也不做
    fn close_transaction(&mut self) -> DBResult<()>;

    fn execute_non_query(&mut self, statement: &Statement) -> DBResult<u64>;

    /// 一次往返执行多条语句
    fn execute_batch(&mut self, statements: &[Statement]) -> DBResult<u64>;

    /// 释放会话；重复调用是安全的
    fn dispose(&mut self) -> DBResult<()>;

    fn is_disposed(&self) -> bool;
}

/// 基于 [`Connection`] 的默认执行器
pub struct DbExecutor {
    id: ExecutorId,
    connection: Option<Box<dyn Connection>>,
    data_type: DataBaseType,
    command_timeout: Duration,
    state: TransactionState,
}

impl DbExecutor {
    /// 使用已建立的会话创建执行器
    pub fn new(
        connection: Box<dyn Connection>,
        data_type: DataBaseType,
        command_timeout: Duration,
    ) -> Self {
        Self {
            id: EXECUTOR_ID_GENERATOR.fetch_add(1, Ordering::SeqCst),
            connection: Some(connection),
            data_type,
            command_timeout,
            state: TransactionState::NoTransaction,
        }
    }

    /// 解析连接字符串并通过工厂建立会话
    ///
    /// 连接字符串格式错误或超时为 0 时立即返回配置错误
    pub fn connect(
        factory: &dyn ConnectionFactory,
        connection_string: &str,
        data_type: DataBaseType,
        command_timeout_secs: u64,
    ) -> DBResult<Self> {
        if command_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(command_timeout_secs).into());
        }
        let descriptor = ConnectionDescriptor::parse(connection_string)?;
        let connection = factory.open(&descriptor, data_type)?;

        let executor = Self::new(
            connection,
            data_type,
            Duration::from_secs(command_timeout_secs),
        );
        log::debug!(
            "执行器 {} 已连接: {} ({})",
            executor.id,
            descriptor,
            data_type
        );
        Ok(executor)
    }

    pub fn id(&self) -> ExecutorId {
        self.id
    }

    fn connection_mut(&mut self) -> DBResult<&mut Box<dyn Connection>> {
        self.connection.as_mut().ok_or(DBError::Disposed)
    }
}

impl CommandExecutor for DbExecutor {
    fn data_type(&self) -> DataBaseType {
        self.data_type
    }

    fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    fn transaction_state(&self) -> TransactionState {
        self.state
    }

    fn open_transaction(&mut self, isolation: IsolationLevel) -> DBResult<()> {
        match self.state {
            TransactionState::Open(current) if current == isolation => {
                log::debug!("执行器 {} 已有 {} 事务，沿用", self.id, current);
                return Ok(());
            }
            TransactionState::Open(current) => {
                return Err(TransactionError::IsolationMismatch {
                    current,
                    requested: isolation,
                }
                .into());
            }
            TransactionState::Committed => self.close_transaction()?,
            TransactionState::NoTransaction => {}
        }

        self.connection_mut()?
            .begin(isolation)
            .map_err(|e| TransactionError::BeginFailed(e.to_string()))?;
        self.state = TransactionState::Open(isolation);
        log::trace!("执行器 {} 开启事务: {}", self.id, isolation);
        Ok(())
    }

    fn commit(&mut self) -> DBResult<()> {
        match self.state {
            TransactionState::Open(_) => {}
            TransactionState::Committed => return Err(TransactionError::AlreadyCommitted.into()),
            TransactionState::NoTransaction => {
                return Err(TransactionError::NoActiveTransaction.into())
            }
        }

        self.connection_mut()?
            .commit()
            .map_err(|e| TransactionError::CommitFailed(e.to_string()))?;
        self.state = TransactionState::Committed;
        log::trace!("执行器 {} 提交事务", self.id);
        Ok(())
    }

    fn rollback(&mut self) -> DBResult<()> {
        match self.state {
            TransactionState::Open(_) => {}
            TransactionState::Committed => return Err(TransactionError::AlreadyCommitted.into()),
            TransactionState::NoTransaction => {
                return Err(TransactionError::NoActiveTransaction.into())
            }
        }

        // 无论驱动回滚是否成功，事务都不再可用
        self.state = TransactionState::NoTransaction;
        self.connection_mut()?
            .rollback()
            .map_err(|e| TransactionError::RollbackFailed(e.to_string()))?;
        log::trace!("执行器 {} 回滚事务", self.id);
        Ok(())
    }

    fn close_transaction(&mut self) -> DBResult<()> {
        match self.state {
            TransactionState::NoTransaction => Ok(()),
            TransactionState::Committed => {
                self.state = TransactionState::NoTransaction;
                Ok(())
            }
            TransactionState::Open(_) => {
                log::debug!("执行器 {} 关闭未提交的事务，修改将被丢弃", self.id);
                self.rollback()
            }
        }
    }

    fn execute_non_query(&mut self, statement: &Statement) -> DBResult<u64> {
        let timeout = self.command_timeout;
        self.connection_mut()?.execute(statement, timeout)
    }

    fn execute_batch(&mut self, statements: &[Statement]) -> DBResult<u64> {
        if statements.is_empty() {
            return Ok(0);
        }
        let timeout = self.command_timeout;
        self.connection_mut()?.execute_batch(statements, timeout)
    }

    fn dispose(&mut self) -> DBResult<()> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        if self.state.is_open() {
            if let Err(e) = connection.rollback() {
                log::warn!("执行器 {} 释放时回滚事务失败: {}", self.id, e);
            }
        }
        self.state = TransactionState::NoTransaction;

        connection.close()?;
        log::debug!("执行器 {} 已释放", self.id);
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.connection.is_none()
    }
}

impl Drop for DbExecutor {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            log::warn!("执行器 {} 析构时释放失败: {}", self.id, e);
        }
    }
}

impl std::fmt::Debug for DbExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbExecutor")
            .field("id", &self.id)
            .field("data_type", &self.data_type)
            .field("command_timeout", &self.command_timeout)
            .field("state", &self.state)
            .field("disposed", &self.connection.is_none())
            .finish()
    }
}
