//! 表上下文统计信息

use std::sync::atomic::{AtomicU64, Ordering};

/// 表上下文统计信息
#[derive(Debug, Default)]
pub struct ContextStats {
    /// 保存修改次数
    saves: AtomicU64,
    /// 保存失败次数
    failed_saves: AtomicU64,
    /// 进入合并缓冲的命令数
    buffered_commands: AtomicU64,
    /// 立即执行的命令数
    immediate_commands: AtomicU64,
    /// 累计受影响行数
    affected_rows: AtomicU64,
}

impl ContextStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_save(&self, rows: u64) {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.affected_rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_save(&self) {
        self.failed_saves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_buffered(&self) {
        self.buffered_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_immediate(&self, rows: u64) {
        self.immediate_commands.fetch_add(1, Ordering::Relaxed);
        self.affected_rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn failed_saves(&self) -> u64 {
        self.failed_saves.load(Ordering::Relaxed)
    }

    pub fn buffered_commands(&self) -> u64 {
        self.buffered_commands.load(Ordering::Relaxed)
    }

    pub fn immediate_commands(&self) -> u64 {
        self.immediate_commands.load(Ordering::Relaxed)
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows.load(Ordering::Relaxed)
    }
}
