//! 表上下文
//!
//! 将一个命令执行器与一个查询累加器绑定到某张表上，
//! 负责合并执行的保存协议、事务边界以及资源释放

use std::fmt;

use crate::config::{DbConfig, DbRegistry, DEFAULT_COMMAND_TIMEOUT};
use crate::context::stats::ContextStats;
use crate::core::{DBError, DBResult, DataBaseType};
use crate::query::{MergeQueue, PendingCommand, QueryAccumulator, Statement};
use crate::storage::{CommandExecutor, ConnectionFactory, DbExecutor};
use crate::transaction::IsolationLevel;

/// 通过连接字符串建立上下文时使用的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connection_string: String,
    pub data_type: DataBaseType,
    /// 命令超时时间（秒）
    pub command_timeout: u64,
}

impl ConnectOptions {
    /// 默认使用 SqlServer，超时 30 秒
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            data_type: DataBaseType::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_data_type(mut self, data_type: DataBaseType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_command_timeout(mut self, command_timeout: u64) -> Self {
        self.command_timeout = command_timeout;
        self
    }
}

impl From<&DbConfig> for ConnectOptions {
    fn from(db: &DbConfig) -> Self {
        Self {
            connection_string: db.connection_string.clone(),
            data_type: db.data_type,
            command_timeout: db.command_timeout,
        }
    }
}

/// 表上下文
///
/// 执行器为独占持有，释放后引用被清空，之后的任何操作都返回 [`DBError::Disposed`]。
/// 上下文在析构时自动释放，因此无论正常返回还是提前返回、出错，执行器都只会被释放一次。
///
/// ```ignore
/// let mut ctx = TableContext::from_registry(&registry, 0, Some("users"))?;
/// ctx.insert(Statement::new("INSERT INTO users (name) VALUES (@name)").with_param("name", "a"))?;
/// ctx.insert(Statement::new("INSERT INTO users (name) VALUES (@name)").with_param("name", "b"))?;
/// let rows = ctx.save_changes()?;
/// ```
pub struct TableContext {
    database: Option<Box<dyn CommandExecutor>>,
    query: Box<dyn QueryAccumulator>,
    /// true：启用合并执行命令并延迟执行
    is_merge_command: bool,
    table_name: Option<String>,
    stats: ContextStats,
}

impl TableContext {
    /// 按数据库索引从注册表解析连接配置
    pub fn from_registry(
        registry: &DbRegistry,
        db_index: usize,
        table_name: Option<&str>,
    ) -> DBResult<Self> {
        let db = registry.get(db_index)?;
        Self::with_connection(registry.factory(), ConnectOptions::from(db), table_name)
    }

    /// 使用注册表中索引为 0 的数据库
    pub fn from_default(registry: &DbRegistry, table_name: Option<&str>) -> DBResult<Self> {
        Self::from_registry(registry, 0, table_name)
    }

    /// 通过自定义连接字符串连接数据库
    pub fn with_connection(
        factory: &dyn ConnectionFactory,
        options: ConnectOptions,
        table_name: Option<&str>,
    ) -> DBResult<Self> {
        let executor = DbExecutor::connect(
            factory,
            &options.connection_string,
            options.data_type,
            options.command_timeout,
        )?;
        Ok(Self::new(Box::new(executor), table_name))
    }

    /// 使用已建立的执行器，默认开启合并执行
    pub fn new(executor: Box<dyn CommandExecutor>, table_name: Option<&str>) -> Self {
        Self {
            database: Some(executor),
            query: Box::new(MergeQueue::new(table_name)),
            is_merge_command: true,
            table_name: table_name.map(str::to_string),
            stats: ContextStats::new(),
        }
    }

    /// 替换查询累加器；已释放的上下文返回 [`DBError::Disposed`]
    pub fn with_query(mut self, query: Box<dyn QueryAccumulator>) -> DBResult<Self> {
        if self.is_disposed() {
            return Err(DBError::Disposed);
        }
        self.query = query;
        Ok(self)
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn is_merge_command(&self) -> bool {
        self.is_merge_command
    }

    /// 切换合并执行模式
    ///
    /// 关闭后已缓冲的命令仍留在缓冲区，下一条立即执行的命令会先把它们提交出去
    pub fn set_merge_command(&mut self, enabled: bool) -> DBResult<()> {
        if self.is_disposed() {
            return Err(DBError::Disposed);
        }
        self.is_merge_command = enabled;
        Ok(())
    }

    /// 缓冲区中待执行的命令数
    pub fn pending_len(&self) -> DBResult<usize> {
        if self.is_disposed() {
            return Err(DBError::Disposed);
        }
        Ok(self.query.pending_len())
    }

    pub fn stats(&self) -> &ContextStats {
        &self.stats
    }

    pub fn is_disposed(&self) -> bool {
        self.database.is_none()
    }

    pub fn executor(&self) -> DBResult<&dyn CommandExecutor> {
        self.database.as_deref().ok_or(DBError::Disposed)
    }

    /// 提交一条命令
    ///
    /// 合并模式下只进入缓冲区并返回 0；否则立即执行并返回该命令的受影响行数。
    /// 立即执行前若缓冲区仍有命令，先按顺序把它们提交，保证执行顺序与调用顺序一致
    pub fn execute(&mut self, command: PendingCommand) -> DBResult<u64> {
        let database = self.database.as_deref_mut().ok_or(DBError::Disposed)?;

        if self.is_merge_command {
            self.query.push(command);
            self.stats.record_buffered();
            return Ok(0);
        }

        if self.query.pending_len() > 0 {
            let flushed = self.query.commit(database)?;
            log::debug!("立即执行前提交了缓冲命令, 受影响行数: {}", flushed);
            self.stats.record_save(flushed);
        }

        let rows = database.execute_non_query(&command.statement)?;
        self.stats.record_immediate(rows);
        Ok(rows)
    }

    pub fn insert(&mut self, statement: Statement) -> DBResult<u64> {
        self.execute(PendingCommand::insert(statement))
    }

    pub fn update(&mut self, statement: Statement) -> DBResult<u64> {
        self.execute(PendingCommand::update(statement))
    }

    pub fn delete(&mut self, statement: Statement) -> DBResult<u64> {
        self.execute(PendingCommand::delete(statement))
    }

    /// 在 Serializable 事务中保存修改
    pub fn save_changes(&mut self) -> DBResult<u64> {
        self.save_changes_with(true)
    }

    /// 保存修改
    ///
    /// `isolate_transaction` 为 true 时在 Serializable 事务中一次性提交全部缓冲命令；
    /// 为 false 时先关闭执行器上可能存在的事务（不提交），再在事务外提交。
    /// 两种情况下，执行器上原有的未提交事务都会被丢弃，不会随本次保存一起提交。
    ///
    /// 合并提交或事务提交失败时，会回滚并关闭本次开启的事务，然后原样返回错误。
    pub fn save_changes_with(&mut self, isolate_transaction: bool) -> DBResult<u64> {
        let database = self.database.as_deref_mut().ok_or(DBError::Disposed)?;

        log::debug!(
            "保存修改: 表={}, 待执行命令={}, 事务={}",
            self.table_name.as_deref().unwrap_or("<未绑定>"),
            self.query.pending_len(),
            isolate_transaction
        );

        let result = Self::flush(database, self.query.as_mut(), isolate_transaction);
        match &result {
            Ok(rows) => self.stats.record_save(*rows),
            Err(e) => {
                self.stats.record_failed_save();
                log::debug!("保存修改失败: {}", e);
            }
        }
        result
    }

    fn flush(
        database: &mut dyn CommandExecutor,
        query: &mut dyn QueryAccumulator,
        isolate_transaction: bool,
    ) -> DBResult<u64> {
        if !isolate_transaction {
            database.close_transaction()?;
            return query.commit(database);
        }

        // 调用方遗留的事务不能混进本次提交
        if database.transaction_state().is_active() {
            database.close_transaction()?;
        }
        database.open_transaction(IsolationLevel::Serializable)?;

        let outcome = match query.commit(database) {
            Ok(rows) => database.commit().map(|_| rows),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(rows) => {
                database.close_transaction()?;
                Ok(rows)
            }
            Err(e) => {
                Self::abandon_transaction(database);
                Err(e)
            }
        }
    }

    /// 回滚并关闭事务，失败只记录日志，不覆盖原始错误
    fn abandon_transaction(database: &mut dyn CommandExecutor) {
        if database.transaction_state().is_open() {
            if let Err(e) = database.rollback() {
                log::warn!("保存失败后回滚事务失败: {}", e);
            }
        }
        if let Err(e) = database.close_transaction() {
            log::warn!("保存失败后关闭事务失败: {}", e);
        }
    }

    /// 释放资源
    ///
    /// 释放执行器并清空引用，未保存的缓冲命令被丢弃。重复调用什么也不做。
    pub fn dispose(&mut self) -> DBResult<()> {
        let Some(mut database) = self.database.take() else {
            return Ok(());
        };

        let pending = self.query.pending_len();
        if pending > 0 {
            log::warn!(
                "释放表上下文时丢弃 {} 条未保存的命令, 表: {}",
                pending,
                self.table_name.as_deref().unwrap_or("<未绑定>")
            );
            self.query.clear();
        }

        database.dispose()
    }
}

impl Drop for TableContext {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            log::warn!("表上下文析构时释放失败: {}", e);
        }
    }
}

impl fmt::Debug for TableContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableContext")
            .field("table_name", &self.table_name)
            .field("is_merge_command", &self.is_merge_command)
            .field("pending", &self.query.pending_len())
            .field("disposed", &self.database.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_storage::{JournalEntry, MemoryDatabase};
    use crate::transaction::TransactionState;
    use std::time::Duration;

    fn create_test_context(db: &MemoryDatabase) -> TableContext {
        let executor = DbExecutor::new(db.connect(), DataBaseType::SQLite, Duration::from_secs(30));
        TableContext::new(Box::new(executor), Some("users"))
    }

    #[test]
    fn test_new_defaults() {
        let db = MemoryDatabase::new();
        let ctx = create_test_context(&db);
        assert!(ctx.is_merge_command());
        assert!(!ctx.is_disposed());
        assert_eq!(ctx.table_name(), Some("users"));
        assert_eq!(ctx.pending_len(), Ok(0));
    }

    #[test]
    fn test_connect_options_defaults() {
        let options = ConnectOptions::new("Server=.");
        assert_eq!(options.data_type, DataBaseType::SqlServer);
        assert_eq!(options.command_timeout, 30);
    }

    #[test]
    fn test_merge_mode_buffers() {
        let db = MemoryDatabase::new();
        let mut ctx = create_test_context(&db);

        let rows = ctx.insert(Statement::new("INSERT A")).expect("插入失败");
        assert_eq!(rows, 0);
        assert_eq!(ctx.pending_len(), Ok(1));
        assert!(db.committed().is_empty());
        assert_eq!(ctx.stats().buffered_commands(), 1);
    }

    #[test]
    fn test_immediate_mode_executes() {
        let db = MemoryDatabase::new();
        let mut ctx = create_test_context(&db);
        ctx.set_merge_command(false).expect("切换模式失败");

        let rows = ctx.delete(Statement::new("DELETE A")).expect("删除失败");
        assert_eq!(rows, 1);
        assert_eq!(ctx.pending_len(), Ok(0));
        assert_eq!(db.committed(), vec![Statement::new("DELETE A")]);
        assert!(db
            .journal()
            .contains(&JournalEntry::Execute(Statement::new("DELETE A"))));
    }

    #[test]
    fn test_save_changes_isolated() {
        let db = MemoryDatabase::new();
        let mut ctx = create_test_context(&db);
        ctx.insert(Statement::new("INSERT A")).expect("插入失败");
        ctx.update(Statement::new("UPDATE B")).expect("更新失败");

        let rows = ctx.save_changes().expect("保存失败");
        assert_eq!(rows, 2);
        assert_eq!(ctx.pending_len(), Ok(0));
        assert_eq!(
            ctx.executor().expect("上下文已释放").transaction_state(),
            TransactionState::NoTransaction
        );
        assert_eq!(db.committed().len(), 2);
        assert_eq!(ctx.stats().saves(), 1);
        assert_eq!(ctx.stats().affected_rows(), 2);
    }

    #[test]
    fn test_dispose_twice_and_use_after_dispose() {
        let db = MemoryDatabase::new();
        let mut ctx = create_test_context(&db);
        ctx.insert(Statement::new("INSERT A")).expect("插入失败");

        ctx.dispose().expect("释放失败");
        assert!(ctx.is_disposed());
        assert_eq!(ctx.pending_len(), Err(DBError::Disposed));
        assert_eq!(ctx.set_merge_command(false), Err(DBError::Disposed));
        assert!(ctx.is_merge_command());
        assert_eq!(db.open_connections(), 0);

        ctx.dispose().expect("重复释放不应失败");
        assert_eq!(ctx.save_changes(), Err(DBError::Disposed));
        assert_eq!(ctx.insert(Statement::new("INSERT B")), Err(DBError::Disposed));
        assert!(ctx.executor().is_err());
        assert!(db.committed().is_empty());
    }

    #[test]
    fn test_drop_disposes() {
        let db = MemoryDatabase::new();
        {
            let _ctx = create_test_context(&db);
            assert_eq!(db.open_connections(), 1);
        }
        assert_eq!(db.open_connections(), 0);
        assert_eq!(db.journal().last(), Some(&JournalEntry::Close));
    }
}
