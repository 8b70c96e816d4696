//! 内存驱动
//!
//! 记录每一次驱动调用的内存数据库，可按需注入故障。
//! 事务内执行的语句先暂存，提交后才进入已持久化列表，回滚则丢弃。

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::{DBError, DBResult, DataBaseType};
use crate::query::Statement;
use crate::storage::connection::{Connection, ConnectionDescriptor, ConnectionFactory};
use crate::transaction::IsolationLevel;

/// 驱动调用日志条目
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    Open {
        connection_string: String,
        data_type: DataBaseType,
    },
    Begin(IsolationLevel),
    Execute(Statement),
    /// 一次往返执行的整批语句
    Batch(Vec<Statement>),
    Commit,
    Rollback,
    Close,
}

/// 故障注入点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPoint {
    Open,
    Begin,
    /// SQL 文本包含该子串的语句执行失败
    Execute(String),
    Commit,
    Rollback,
    Close,
}

#[derive(Debug)]
struct MemoryState {
    journal: Vec<JournalEntry>,
    committed: Vec<Statement>,
    failures: Vec<FailPoint>,
    rows_per_statement: u64,
    open_connections: usize,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            journal: Vec::new(),
            committed: Vec::new(),
            failures: Vec::new(),
            rows_per_statement: 1,
            open_connections: 0,
        }
    }
}

impl MemoryState {
    fn should_fail(&self, point: &FailPoint) -> bool {
        self.failures.iter().any(|failure| match (failure, point) {
            (FailPoint::Execute(pattern), FailPoint::Execute(sql)) => sql.contains(pattern.as_str()),
            (a, b) => a == b,
        })
    }
}

/// 共享的内存数据库句柄
///
/// 克隆得到的句柄指向同一份状态，测试可以在连接被移交给上下文之后继续观察
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置每条语句返回的受影响行数
    pub fn with_rows_per_statement(self, rows: u64) -> Self {
        self.state.lock().rows_per_statement = rows;
        self
    }

    /// 注入故障，直到调用 `clear_failures` 前一直生效
    pub fn fail_on(&self, point: FailPoint) {
        self.state.lock().failures.push(point);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// 驱动调用日志快照
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().journal.clone()
    }

    /// 已持久化的语句
    pub fn committed(&self) -> Vec<Statement> {
        self.state.lock().committed.clone()
    }

    pub fn open_connections(&self) -> usize {
        self.state.lock().open_connections
    }

    pub fn factory(&self) -> MemoryConnectionFactory {
        MemoryConnectionFactory { db: self.clone() }
    }

    /// 直接建立一个会话，不经过连接字符串解析
    pub fn connect(&self) -> Box<dyn Connection> {
        let mut state = self.state.lock();
        state.open_connections += 1;
        state.journal.push(JournalEntry::Open {
            connection_string: ":memory:".to_string(),
            data_type: DataBaseType::SQLite,
        });
        drop(state);

        Box::new(MemoryConnection {
            db: self.clone(),
            staged: None,
            closed: false,
        })
    }
}

/// 内存连接工厂
#[derive(Debug, Clone)]
pub struct MemoryConnectionFactory {
    db: MemoryDatabase,
}

impl ConnectionFactory for MemoryConnectionFactory {
    fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        data_type: DataBaseType,
    ) -> DBResult<Box<dyn Connection>> {
        let mut state = self.db.state.lock();
        if state.should_fail(&FailPoint::Open) {
            return Err(DBError::Connection(format!("无法连接: {}", descriptor)));
        }
        state.open_connections += 1;
        state.journal.push(JournalEntry::Open {
            connection_string: descriptor.as_str().to_string(),
            data_type,
        });
        drop(state);

        Ok(Box::new(MemoryConnection {
            db: self.db.clone(),
            staged: None,
            closed: false,
        }))
    }
}

/// 内存会话
#[derive(Debug)]
pub struct MemoryConnection {
    db: MemoryDatabase,
    /// 事务内暂存的语句，`None` 表示没有事务
    staged: Option<Vec<Statement>>,
    closed: bool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> DBResult<()> {
        if self.closed {
            return Err(DBError::Connection("会话已关闭".to_string()));
        }
        Ok(())
    }

    fn apply(&mut self, state: &mut MemoryState, statement: &Statement) -> DBResult<u64> {
        if state.should_fail(&FailPoint::Execute(statement.sql.clone())) {
            return Err(DBError::Execution(format!("语句执行失败: {}", statement)));
        }
        match self.staged.as_mut() {
            Some(staged) => staged.push(statement.clone()),
            None => state.committed.push(statement.clone()),
        }
        Ok(state.rows_per_statement)
    }
}

impl Connection for MemoryConnection {
    fn begin(&mut self, isolation: IsolationLevel) -> DBResult<()> {
        self.ensure_open()?;
        let mut state = self.db.state.lock();
        if state.should_fail(&FailPoint::Begin) {
            return Err(DBError::Execution("无法开启事务".to_string()));
        }
        if self.staged.is_some() {
            return Err(DBError::Execution("不支持嵌套事务".to_string()));
        }
        state.journal.push(JournalEntry::Begin(isolation));
        self.staged = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> DBResult<()> {
        self.ensure_open()?;
        let mut state = self.db.state.lock();
        if state.should_fail(&FailPoint::Commit) {
            return Err(DBError::Execution("无法提交事务".to_string()));
        }
        let staged = self
            .staged
            .take()
            .ok_or_else(|| DBError::Execution("没有活跃的事务".to_string()))?;
        state.journal.push(JournalEntry::Commit);
        state.committed.extend(staged);
        Ok(())
    }

    fn rollback(&mut self) -> DBResult<()> {
        self.ensure_open()?;
        let mut state = self.db.state.lock();
        if state.should_fail(&FailPoint::Rollback) {
            return Err(DBError::Execution("无法回滚事务".to_string()));
        }
        state.journal.push(JournalEntry::Rollback);
        self.staged = None;
        Ok(())
    }

    fn execute(&mut self, statement: &Statement, _timeout: Duration) -> DBResult<u64> {
        self.ensure_open()?;
        let db = self.db.clone();
        let mut state = db.state.lock();
        state.journal.push(JournalEntry::Execute(statement.clone()));
        self.apply(&mut state, statement)
    }

    fn execute_batch(&mut self, statements: &[Statement], _timeout: Duration) -> DBResult<u64> {
        self.ensure_open()?;
        let db = self.db.clone();
        let mut state = db.state.lock();
        state.journal.push(JournalEntry::Batch(statements.to_vec()));

        let mut affected = 0;
        for statement in statements {
            affected += self.apply(&mut state, statement)?;
        }
        Ok(affected)
    }

    fn close(&mut self) -> DBResult<()> {
        if self.closed {
            return Ok(());
        }
        let mut state = self.db.state.lock();
        if state.should_fail(&FailPoint::Close) {
            return Err(DBError::Connection("无法关闭会话".to_string()));
        }
        state.journal.push(JournalEntry::Close);
        state.open_connections -= 1;
        self.staged = None;
        self.closed = true;
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if !self.closed {
            let mut state = self.db.state.lock();
            state.open_connections = state.open_connections.saturating_sub(1);
        }
    }
}
