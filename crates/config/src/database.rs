//! 数据库配置

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::section::{ConfigSection, to_map};
use crate::ConfigError;

/// 默认连接重试上限
pub const DEFAULT_DB_RETRY_LIMITS: u32 = 30;

/// 数据库提供方，连接工厂按它做穷尽分派
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    Postgres,
    MySql,
}

impl DatabaseProvider {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "postgres" => Some(DatabaseProvider::Postgres),
            "mysql" => Some(DatabaseProvider::MySql),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseProvider::Postgres => "postgres",
            DatabaseProvider::MySql => "mysql",
        }
    }
}

/// 数据库配置（`[[databases]]` 段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 上下文名，同组内唯一
    pub context_name: String,
    /// 提供方，postgres 或 mysql
    pub provider: String,
    /// 数据库地址，形如 host:port
    pub url: String,
    pub user: String,
    pub password: String,
    pub database_name: String,
    /// 连接重试上限（尝试次数）
    pub retry_limits: u32,
    /// 连接最大生命周期（秒），0 表示不限制
    pub connection_max_life_time: i64,
    /// 空闲连接数上限，0 表示不保留空闲连接
    pub max_idle_conns: u32,
    /// 打开连接数上限，0 表示不限制
    pub max_open_conns: u32,
    /// 连接建立后按序执行的初始化脚本
    pub initial_scripts: Vec<String>,
    #[serde(skip)]
    pub(crate) bound: bool,
}

impl DatabaseConfig {
    /// 以必填字段创建配置，其余字段走 bind 默认值
    pub fn new(
        context_name: impl Into<String>,
        provider: DatabaseProvider,
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            context_name: context_name.into(),
            provider: provider.as_str().to_string(),
            url: url.into(),
            user: user.into(),
            password: password.into(),
            database_name: database_name.into(),
            ..Default::default()
        }
    }

    /// 设置重试上限
    pub fn with_retry_limits(mut self, limits: u32) -> Self {
        self.retry_limits = limits;
        self
    }

    /// 设置连接池参数
    pub fn with_pool(mut self, max_idle: u32, max_open: u32) -> Self {
        self.max_idle_conns = max_idle;
        self.max_open_conns = max_open;
        self
    }

    /// 追加初始化脚本
    pub fn with_initial_script(mut self, path: impl Into<String>) -> Self {
        self.initial_scripts.push(path.into());
        self
    }

    /// 解析后的提供方，validate 之后必为 Some
    pub fn provider(&self) -> Option<DatabaseProvider> {
        DatabaseProvider::parse(&self.provider)
    }

    /// 连接最大生命周期，0 归一化为 None
    pub fn max_lifetime(&self) -> Option<Duration> {
        if self.connection_max_life_time > 0 {
            Some(Duration::from_secs(self.connection_max_life_time as u64))
        } else {
            None
        }
    }
}

impl ConfigSection for DatabaseConfig {
    fn bind(&mut self) -> Result<(), ConfigError> {
        if self.bound {
            return Ok(());
        }
        self.context_name = self.context_name.trim().to_string();
        self.provider = self.provider.trim().to_lowercase();
        if self.retry_limits == 0 {
            self.retry_limits = DEFAULT_DB_RETRY_LIMITS;
        }
        if self.connection_max_life_time < 0 {
            self.connection_max_life_time = 0;
        }
        self.bound = true;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.context_name.is_empty() {
            return Err(ConfigError::DbContextNameRequired);
        }
        if self.provider().is_none() {
            return Err(ConfigError::InvalidDbProvider(self.provider.clone()));
        }
        if self.url.trim().is_empty() {
            return Err(ConfigError::DbUrlRequired);
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::DbUserRequired);
        }
        if self.password.trim().is_empty() {
            return Err(ConfigError::DbPasswordRequired);
        }
        if self.database_name.trim().is_empty() {
            return Err(ConfigError::DbNameRequired);
        }
        Ok(())
    }

    fn describe(&self) -> Map<String, Value> {
        to_map(self)
    }
}
