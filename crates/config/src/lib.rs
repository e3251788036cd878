//! armature-config - 配置加载库
//!
//! 四种配置段（API、日志、数据库、缓存）共享同一个 Bind/Validate 契约：
//! `bind` 原地填充默认值并做单位归一化，`validate` 只做校验不做修改。
//! 调用顺序固定为先 bind 后 validate。

use armature_errors::AppError;
use thiserror::Error;

mod api;
mod cache;
mod database;
mod log;
mod registry;
mod section;

pub use api::{ApiConfig, DEFAULT_HEALTH_CHECK_ENDPOINT, DEFAULT_PORT, DEFAULT_SSL_PORT};
pub use cache::CacheConfig;
pub use database::{DEFAULT_DB_RETRY_LIMITS, DatabaseConfig, DatabaseProvider};
pub use log::{LogConfig, LogLevel};
pub use registry::ConfigRegistry;
pub use section::{ConfigSection, Section};

/// 配置错误，带字段级错误信息
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("port is invalid")]
    InvalidPort,

    #[error("ssl port is invalid")]
    InvalidSslPort,

    #[error("ssl certificate file is required")]
    SslCertFileRequired,

    #[error("ssl certificate file [{0}] not found")]
    SslCertFileNotFound(String),

    #[error("ssl key file is required")]
    SslKeyFileRequired,

    #[error("ssl key file [{0}] not found")]
    SslKeyFileNotFound(String),

    #[error("database context name is required")]
    DbContextNameRequired,

    #[error("database provider is invalid: {0}")]
    InvalidDbProvider(String),

    #[error("database url is required")]
    DbUrlRequired,

    #[error("database url [{0}] must match <host>:<port>")]
    DbUrlPattern(String),

    #[error("database user is required")]
    DbUserRequired,

    #[error("database password is required")]
    DbPasswordRequired,

    #[error("database name is required")]
    DbNameRequired,

    #[error("database context name [{0}] is duplicate")]
    DuplicateDbContextName(String),

    #[error("redis context name is required")]
    CacheContextNameRequired,

    #[error("redis endpoint is required")]
    CacheEndpointRequired,

    #[error("redis context name [{0}] is duplicate")]
    DuplicateCacheContextName(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::config(err.to_string())
    }
}

#[cfg(test)]
mod tests;
