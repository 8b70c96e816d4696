//! 驱动层连接抽象
//!
//! 具体数据库厂商通过实现 [`Connection`] 与 [`ConnectionFactory`] 接入，
//! 单条语句在网络层如何执行不属于本模块的职责

use std::fmt;
use std::time::Duration;

use crate::core::{ConfigError, DBResult, DataBaseType};
use crate::query::Statement;
use crate::transaction::IsolationLevel;

/// 解析后的连接描述符
///
/// 形如 `Server=.;Database=app;User ID=sa`，键不区分大小写
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    raw: String,
    pairs: Vec<(String, String)>,
}

impl ConnectionDescriptor {
    /// 解析连接字符串
    ///
    /// 空字符串、缺少 `=` 的片段以及空键都视为格式错误
    pub fn parse(connection_string: &str) -> Result<Self, ConfigError> {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MalformedConnectionString(
                "连接字符串为空".to_string(),
            ));
        }

        let mut pairs = Vec::new();
        for segment in trimmed.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (key, value) = segment.split_once('=').ok_or_else(|| {
                ConfigError::MalformedConnectionString(format!("片段缺少 '=': {}", segment))
            })?;

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::MalformedConnectionString(format!(
                    "片段缺少键名: {}",
                    segment
                )));
            }

            pairs.push((key.to_ascii_lowercase(), value.trim().to_string()));
        }

        if pairs.is_empty() {
            return Err(ConfigError::MalformedConnectionString(format!(
                "没有任何键值对: {}",
                connection_string
            )));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            pairs,
        })
    }

    /// 按键查找值（不区分大小写，后出现的键覆盖先出现的）
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 不输出密码
        let mut first = true;
        for (key, value) in &self.pairs {
            if !first {
                write!(f, ";")?;
            }
            first = false;
            if key == "password" || key == "pwd" {
                write!(f, "{}=***", key)?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

/// 一个活动的数据库会话
pub trait Connection: Send {
    /// 以指定隔离级别开启事务
    fn begin(&mut self, isolation: IsolationLevel) -> DBResult<()>;

    fn commit(&mut self) -> DBResult<()>;

    fn rollback(&mut self) -> DBResult<()>;

    /// 执行单条语句，返回受影响行数
    fn execute(&mut self, statement: &Statement, timeout: Duration) -> DBResult<u64>;

    /// 在一次往返中按顺序执行多条语句，返回受影响行数之和
    ///
    /// 默认实现逐条执行，不支持批量提交的驱动可以直接沿用
    fn execute_batch(&mut self, statements: &[Statement], timeout: Duration) -> DBResult<u64> {
        let mut affected = 0;
        for statement in statements {
            affected += self.execute(statement, timeout)?;
        }
        Ok(affected)
    }

    /// 关闭会话，释放底层资源
    fn close(&mut self) -> DBResult<()>;
}

/// 连接工厂
pub trait ConnectionFactory: Send + Sync {
    fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        data_type: DataBaseType,
    ) -> DBResult<Box<dyn Connection>>;
}
