use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::{ConfigError, DataBaseType};
use crate::storage::ConnectionDescriptor;

pub mod registry;

pub use registry::DbRegistry;

/// 默认命令超时时间（秒）
pub const DEFAULT_COMMAND_TIMEOUT: u64 = 30;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub databases: Vec<DbConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "tablectx".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
        }
    }
}

/// 单个数据库的连接配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DbConfig {
    pub connection_string: String,
    #[serde(default)]
    pub data_type: DataBaseType,
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT
}

impl DbConfig {
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

    /// 校验连接字符串与超时时间
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout == 0 {
            return Err(ConfigError::InvalidTimeout(self.command_timeout));
        }
        ConnectionDescriptor::parse(&self.connection_string)?;
        Ok(())
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        for db in &config.databases {
            db.validate()?;
        }
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.max_files, 5);
        assert!(config.databases.is_empty());
    }

    #[test]
    fn test_config_load_save() {
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");

        let config = Config {
            log: LogConfig::default(),
            databases: vec![
                DbConfig::new("Server=.;Database=app"),
                DbConfig::new("Data Source=app.db")
                    .with_data_type(DataBaseType::SQLite)
                    .with_command_timeout(60),
            ],
        };
        config.save(temp_file.path()).expect("Failed to save config");

        let loaded = Config::load(temp_file.path()).expect("Failed to load config");
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_database_defaults_applied() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        temp_file
            .write_all(b"[[databases]]\nconnection_string = \"Server=.\"\n")
            .expect("Failed to write config");

        let loaded = Config::load(temp_file.path()).expect("Failed to load config");
        assert_eq!(loaded.databases[0].data_type, DataBaseType::SqlServer);
        assert_eq!(loaded.databases[0].command_timeout, DEFAULT_COMMAND_TIMEOUT);
        assert_eq!(loaded.log, LogConfig::default());
    }

    #[test]
    fn test_load_rejects_malformed_connection_string() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        temp_file
            .write_all(b"[[databases]]\nconnection_string = \"garbage\"\ndata_type = \"mysql\"\n")
            .expect("Failed to write config");

        let err = Config::load(temp_file.path()).expect_err("应当拒绝格式错误的连接字符串");
        assert!(matches!(err, ConfigError::MalformedConnectionString(_)));
    }

    #[test]
    fn test_load_rejects_unknown_data_type() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        temp_file
            .write_all(b"[[databases]]\nconnection_string = \"a=b\"\ndata_type = \"db2\"\n")
            .expect("Failed to write config");

        let err = Config::load(temp_file.path()).expect_err("应当拒绝未知的数据库类型");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
