//! 统一错误处理系统
//!
//! ## 设计理念
//!
//! 1. **按层划分**：配置错误、事务错误各自独立成枚举，由 `DBError` 统一汇总
//! 2. **分层转换**：
//!    - 内部错误使用 `#[from]` 注解自动转换
//!    - 外部错误（IO、TOML）使用自定义 `From` 实现转换为字符串，降低模块耦合
//! 3. **统一接口**：`DBResult<T>` 提供统一的返回类型，简化错误传播

use thiserror::Error;

pub use crate::transaction::types::TransactionError;

/// 统一的数据库错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DBError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("表上下文已释放，不能继续使用")]
    Disposed,

    #[error("合并提交失败: {0}")]
    Flush(String),

    #[error("事务错误: {0}")]
    Transaction(#[from] TransactionError),

    #[error("执行错误: {0}")]
    Execution(String),

    #[error("连接错误: {0}")]
    Connection(String),
}

/// 统一的结果类型
pub type DBResult<T> = Result<T, DBError>;

impl DBError {
    /// 是否为使用已释放上下文导致的错误
    pub fn is_disposed(&self) -> bool {
        matches!(self, DBError::Disposed)
    }

    /// 将驱动层的执行错误归类为合并提交错误，其余错误原样保留
    pub fn into_flush(self) -> Self {
        match self {
            DBError::Execution(msg) => DBError::Flush(msg),
            other => other,
        }
    }
}

/// 配置错误
///
/// 构造阶段即暴露，构造失败的上下文不会被返回给调用方
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("数据库索引越界: {index}（共配置 {count} 个数据库）")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("连接字符串格式错误: {0}")]
    MalformedConnectionString(String),

    #[error("无效的命令超时时间: {0}")]
    InvalidTimeout(u64),

    #[error("未知的数据库类型: {0}")]
    UnknownDataType(String),

    #[error("IO错误: {0}")]
    Io(String),

    #[error("配置解析失败: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
