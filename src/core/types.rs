//! 核心类型定义
//!
//! 数据库类型与语句参数值

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// 数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataBaseType {
    #[default]
    SqlServer,
    OleDb,
    MySql,
    SQLite,
    Oracle,
    PostgreSql,
}

impl DataBaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataBaseType::SqlServer => "SqlServer",
            DataBaseType::OleDb => "OleDb",
            DataBaseType::MySql => "MySql",
            DataBaseType::SQLite => "SQLite",
            DataBaseType::Oracle => "Oracle",
            DataBaseType::PostgreSql => "PostgreSql",
        }
    }
}

impl fmt::Display for DataBaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataBaseType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(DataBaseType::SqlServer),
            "oledb" | "access" => Ok(DataBaseType::OleDb),
            "mysql" => Ok(DataBaseType::MySql),
            "sqlite" => Ok(DataBaseType::SQLite),
            "oracle" => Ok(DataBaseType::Oracle),
            "postgresql" | "postgres" => Ok(DataBaseType::PostgreSql),
            _ => Err(ConfigError::UnknownDataType(s.to_string())),
        }
    }
}

impl TryFrom<String> for DataBaseType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataBaseType> for String {
    fn from(value: DataBaseType) -> Self {
        value.as_str().to_string()
    }
}

/// 语句参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
