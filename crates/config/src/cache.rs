//! Redis 缓存配置
//!
//! 时长类字段在文件中以原始整数书写（退避为毫秒、空闲时长为分钟、
//! 超时为秒），bind 时统一换算为毫秒。哨兵值 -1 / -2 保持原样。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::section::{ConfigSection, to_map};
use crate::ConfigError;

const DEFAULT_CACHE_POOL_SIZE: i64 = 10;
const DEFAULT_CACHE_MIN_IDLE_CONNS: i64 = 5;
const DEFAULT_CACHE_MAX_RETRIES: i64 = 3;
const DEFAULT_CACHE_MIN_RETRY_BACKOFF_MS: i64 = 8;
const DEFAULT_CACHE_MAX_RETRY_BACKOFF_MS: i64 = 512;
const DEFAULT_CACHE_MAX_IDLE_TIME_MS: i64 = 30 * 60 * 1000;
const DEFAULT_CACHE_READ_TIMEOUT_MS: i64 = 3000;
const DEFAULT_CACHE_WRITE_TIMEOUT_MS: i64 = 3000;
// 默认池等待 = 默认读超时 + 1 秒
const DEFAULT_CACHE_POOL_TIMEOUT_MS: i64 = DEFAULT_CACHE_READ_TIMEOUT_MS + 1000;

/// 缓存配置（`[[redis]]` 段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 上下文名，同组内唯一
    pub context_name: String,
    /// 服务端地址，形如 host:port
    pub endpoint: String,
    pub password: String,
    /// 连接后选择的数据库序号
    pub db: i64,
    /// 连接池大小
    pub pool_size: i64,
    /// 最小空闲连接数
    pub min_idle_conns: i64,
    /// 命令重试上限，-1 关闭重试
    pub max_retries: i64,
    /// 重试最小退避（毫秒），-1 关闭退避
    pub min_retry_backoff: i64,
    /// 重试最大退避（毫秒），-1 关闭退避
    pub max_retry_backoff: i64,
    /// 连接最大空闲时长（文件中为分钟），-1 关闭空闲检查
    pub max_idle_time: i64,
    /// 等待可用连接的超时（文件中为秒）
    pub pool_timeout: i64,
    /// 读超时（文件中为秒），-1 永久阻塞，-2 不设置期限
    pub read_timeout: i64,
    /// 写超时（文件中为秒），-1 永久阻塞，-2 不设置期限
    pub write_timeout: i64,
    #[serde(skip)]
    pub(crate) bound: bool,
}

impl CacheConfig {
    /// 以必填字段创建配置，其余字段走 bind 默认值
    pub fn new(context_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            context_name: context_name.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// 设置密码
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// 设置数据库序号
    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    /// 设置连接池参数
    pub fn with_pool(mut self, pool_size: i64, min_idle: i64) -> Self {
        self.pool_size = pool_size;
        self.min_idle_conns = min_idle;
        self
    }

    /// 命令重试上限，哨兵 -1 归一化为 None
    pub fn retries(&self) -> Option<u32> {
        if self.max_retries == -1 {
            None
        } else {
            Some(self.max_retries as u32)
        }
    }

    pub fn min_backoff(&self) -> Option<Duration> {
        duration_ms(self.min_retry_backoff)
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        duration_ms(self.max_retry_backoff)
    }

    pub fn idle_time(&self) -> Option<Duration> {
        duration_ms(self.max_idle_time)
    }

    pub fn pool_wait(&self) -> Duration {
        Duration::from_millis(self.pool_timeout as u64)
    }

    /// 读超时；-1（永久阻塞）与 -2（不设期限）均表现为无超时
    pub fn read_deadline(&self) -> Option<Duration> {
        duration_ms(self.read_timeout)
    }

    pub fn write_deadline(&self) -> Option<Duration> {
        duration_ms(self.write_timeout)
    }
}

fn duration_ms(value: i64) -> Option<Duration> {
    if value < 0 {
        None
    } else {
        Some(Duration::from_millis(value as u64))
    }
}

impl ConfigSection for CacheConfig {
    fn bind(&mut self) -> Result<(), ConfigError> {
        // 重复 bind 会把已换算为毫秒的分钟/秒字段再放大一次，
        // 因此第二次调用必须是 no-op
        if self.bound {
            return Ok(());
        }
        self.context_name = self.context_name.trim().to_string();
        self.endpoint = self.endpoint.trim().to_string();
        self.password = self.password.trim().to_string();

        if self.db < 0 {
            self.db = 0;
        }
        if self.pool_size <= 0 {
            self.pool_size = DEFAULT_CACHE_POOL_SIZE;
        }
        if self.min_idle_conns <= 0 {
            self.min_idle_conns = DEFAULT_CACHE_MIN_IDLE_CONNS;
        }
        if self.max_retries <= 0 && self.max_retries != -1 {
            self.max_retries = DEFAULT_CACHE_MAX_RETRIES;
        }

        if self.min_retry_backoff < 8 && self.min_retry_backoff != -1 {
            self.min_retry_backoff = DEFAULT_CACHE_MIN_RETRY_BACKOFF_MS;
        }
        if self.max_retry_backoff < 512 && self.max_retry_backoff != -1 {
            self.max_retry_backoff = DEFAULT_CACHE_MAX_RETRY_BACKOFF_MS;
        }

        if self.max_idle_time < 30 && self.max_idle_time != -1 {
            self.max_idle_time = DEFAULT_CACHE_MAX_IDLE_TIME_MS;
        } else if self.max_idle_time != -1 {
            // 分钟 -> 毫秒
            self.max_idle_time *= 60 * 1000;
        }

        if self.read_timeout <= 0 && self.read_timeout != -1 && self.read_timeout != -2 {
            self.read_timeout = DEFAULT_CACHE_READ_TIMEOUT_MS;
        } else if self.read_timeout != -1 && self.read_timeout != -2 {
            // 秒 -> 毫秒
            self.read_timeout *= 1000;
        }

        if self.write_timeout <= 0 && self.write_timeout != -1 && self.write_timeout != -2 {
            self.write_timeout = DEFAULT_CACHE_WRITE_TIMEOUT_MS;
        } else if self.write_timeout != -1 && self.write_timeout != -2 {
            self.write_timeout *= 1000;
        }

        if self.pool_timeout <= 0 {
            self.pool_timeout = DEFAULT_CACHE_POOL_TIMEOUT_MS;
        } else {
            self.pool_timeout *= 1000;
        }

        self.bound = true;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.context_name.is_empty() {
            return Err(ConfigError::CacheContextNameRequired);
        }
        if self.endpoint.is_empty() {
            return Err(ConfigError::CacheEndpointRequired);
        }
        Ok(())
    }

    fn describe(&self) -> Map<String, Value> {
        to_map(self)
    }
}
