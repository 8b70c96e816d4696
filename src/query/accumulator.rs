//! 查询累加器
//!
//! 缓冲针对某张表发出的命令，在保存修改时作为一次合并执行提交

use crate::core::DBResult;
use crate::query::statement::{PendingCommand, Statement};
use crate::storage::CommandExecutor;

/// 查询累加器
///
/// `commit` 是破坏性的：调用后缓冲区为空。没有待执行命令时返回 0，且不访问数据库。
pub trait QueryAccumulator: Send {
    /// 追加一条待执行命令，保持追加顺序
    fn push(&mut self, command: PendingCommand);

    /// 待执行命令数
    fn pending_len(&self) -> usize;

    /// 按追加顺序查看待执行命令
    fn pending(&self) -> &[PendingCommand];

    /// 丢弃所有待执行命令
    fn clear(&mut self);

    /// 通过执行器一次性提交全部待执行命令，返回受影响行数
    fn commit(&mut self, executor: &mut dyn CommandExecutor) -> DBResult<u64>;
}

/// 默认的合并队列实现
#[derive(Debug, Default)]
pub struct MergeQueue {
    table_name: Option<String>,
    commands: Vec<PendingCommand>,
}

impl MergeQueue {
    pub fn new(table_name: Option<&str>) -> Self {
        Self {
            table_name: table_name.map(str::to_string),
            commands: Vec::new(),
        }
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }
}

impl QueryAccumulator for MergeQueue {
    fn push(&mut self, command: PendingCommand) {
        self.commands.push(command);
    }

    fn pending_len(&self) -> usize {
        self.commands.len()
    }

    fn pending(&self) -> &[PendingCommand] {
        &self.commands
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn commit(&mut self, executor: &mut dyn CommandExecutor) -> DBResult<u64> {
        if self.commands.is_empty() {
            return Ok(0);
        }

        // 先取出缓冲区，失败时也不会在下次提交中重复发送
        let statements: Vec<Statement> = std::mem::take(&mut self.commands)
            .into_iter()
            .map(|command| command.statement)
            .collect();

        log::debug!(
            "合并提交 {} 条命令, 表: {}",
            statements.len(),
            self.table_name.as_deref().unwrap_or("<未绑定>")
        );

        executor
            .execute_batch(&statements)
            .map_err(|e| e.into_flush())
    }
}
