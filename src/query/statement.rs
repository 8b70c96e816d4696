//! 语句与待执行命令
//!
//! SQL 文本由上层查询构建器生成，这里只作为不透明的值传递

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Value;

/// 命名参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 一条可执行的 SQL 语句
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// 追加参数
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push(Param::new(name, value));
        self
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// 命令类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Insert,
    Update,
    Delete,
    Raw,
}

/// 缓冲中的待执行命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub statement: Statement,
}

impl PendingCommand {
    pub fn new(kind: CommandKind, statement: Statement) -> Self {
        Self { kind, statement }
    }

    pub fn insert(statement: Statement) -> Self {
        Self::new(CommandKind::Insert, statement)
    }

    pub fn update(statement: Statement) -> Self {
        Self::new(CommandKind::Update, statement)
    }

    pub fn delete(statement: Statement) -> Self {
        Self::new(CommandKind::Delete, statement)
    }

    pub fn raw(statement: Statement) -> Self {
        Self::new(CommandKind::Raw, statement)
    }
}
