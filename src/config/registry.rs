//! 数据库配置注册表
//!
//! 以显式对象保存“数据库索引 -> 连接配置”的映射，构造表上下文时传入，
//! 不依赖进程级全局状态

use std::sync::Arc;

use crate::config::{Config, DbConfig};
use crate::core::ConfigError;
use crate::storage::ConnectionFactory;

/// 数据库配置注册表
#[derive(Clone)]
pub struct DbRegistry {
    databases: Vec<DbConfig>,
    factory: Arc<dyn ConnectionFactory>,
}

impl DbRegistry {
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            databases: Vec::new(),
            factory,
        }
    }

    /// 从配置文件内容构建，所有数据库配置都会先经过校验
    pub fn from_config(
        config: &Config,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::new(factory);
        for db in &config.databases {
            registry.register(db.clone())?;
        }
        Ok(registry)
    }

    /// 注册一个数据库配置，返回其索引
    pub fn register(&mut self, db: DbConfig) -> Result<usize, ConfigError> {
        db.validate()?;
        self.databases.push(db);
        Ok(self.databases.len() - 1)
    }

    /// 按索引获取配置
    pub fn get(&self, index: usize) -> Result<&DbConfig, ConfigError> {
        self.databases
            .get(index)
            .ok_or(ConfigError::IndexOutOfRange {
                index,
                count: self.databases.len(),
            })
    }

    pub fn factory(&self) -> &dyn ConnectionFactory {
        self.factory.as_ref()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}

impl std::fmt::Debug for DbRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbRegistry")
            .field("databases", &self.databases.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataBaseType;
    use crate::storage::MemoryDatabase;

    fn create_test_registry() -> DbRegistry {
        DbRegistry::new(Arc::new(MemoryDatabase::new().factory()))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = create_test_registry();
        assert!(registry.is_empty());

        let index = registry
            .register(DbConfig::new("Server=.").with_data_type(DataBaseType::MySql))
            .expect("注册失败");
        assert_eq!(index, 0);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(0).expect("获取配置失败").data_type,
            DataBaseType::MySql
        );
    }

    #[test]
    fn test_get_out_of_range() {
        let registry = create_test_registry();
        assert_eq!(
            registry.get(3).unwrap_err(),
            ConfigError::IndexOutOfRange { index: 3, count: 0 }
        );
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut registry = create_test_registry();
        assert!(matches!(
            registry.register(DbConfig::new("Server=.").with_command_timeout(0)),
            Err(ConfigError::InvalidTimeout(0))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            databases: vec![DbConfig::new("a=1"), DbConfig::new("b=2")],
            ..Default::default()
        };
        let registry = DbRegistry::from_config(&config, Arc::new(MemoryDatabase::new().factory()))
            .expect("构建注册表失败");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).expect("获取配置失败").connection_string, "b=2");
    }
}
