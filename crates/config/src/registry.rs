//! 配置注册表
//!
//! 从单一配置文件加载全部配置段并按上下文名索引。启动期一次性写入，
//! 之后只有并发读，读写锁只在加载窗口持有写锁。

use std::collections::HashMap;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::section::ConfigSection;
use crate::{ApiConfig, CacheConfig, ConfigError, DatabaseConfig, LogConfig};

/// 配置注册表
///
/// 环境变量覆盖文件取值（大小写不敏感），嵌套键用双下划线表示，
/// 例如 `API_CONFIG__PORT=9999`。
#[derive(Debug)]
pub struct ConfigRegistry {
    api: RwLock<ApiConfig>,
    log: RwLock<LogConfig>,
    databases: RwLock<HashMap<String, DatabaseConfig>>,
    caches: RwLock<HashMap<String, CacheConfig>>,
}

impl ConfigRegistry {
    /// 从配置文件加载，文件名可省略扩展名（默认补 .toml）
    ///
    /// 固定按 api_config、log_config、databases、redis 的顺序加载，
    /// 任何一段失败都会中止整个加载。缺失的段使用全默认值。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension("toml")
        };

        let figment = Figment::new()
            .merge(Toml::file(file))
            .merge(Env::raw().split("__"));

        let mut api: ApiConfig = section(&figment, "api_config")?;
        api.bind()?;
        api.validate()?;

        let mut log: LogConfig = section(&figment, "log_config")?;
        log.bind()?;
        log.validate()?;

        let mut db_list: Vec<DatabaseConfig> = section(&figment, "databases")?;
        let mut databases = HashMap::new();
        for cfg in &mut db_list {
            cfg.bind()?;
            cfg.validate()?;
            if databases.contains_key(&cfg.context_name) {
                return Err(ConfigError::DuplicateDbContextName(cfg.context_name.clone()));
            }
            databases.insert(cfg.context_name.clone(), cfg.clone());
        }

        let mut cache_list: Vec<CacheConfig> = section(&figment, "redis")?;
        let mut caches = HashMap::new();
        for cfg in &mut cache_list {
            cfg.bind()?;
            cfg.validate()?;
            if caches.contains_key(&cfg.context_name) {
                return Err(ConfigError::DuplicateCacheContextName(
                    cfg.context_name.clone(),
                ));
            }
            caches.insert(cfg.context_name.clone(), cfg.clone());
        }

        Ok(Self {
            api: RwLock::new(api),
            log: RwLock::new(log),
            databases: RwLock::new(databases),
            caches: RwLock::new(caches),
        })
    }

    pub fn api(&self) -> ApiConfig {
        self.api.read().clone()
    }

    pub fn log(&self) -> LogConfig {
        self.log.read().clone()
    }

    pub fn database(&self, context_name: &str) -> Option<DatabaseConfig> {
        self.databases.read().get(context_name).cloned()
    }

    pub fn cache(&self, context_name: &str) -> Option<CacheConfig> {
        self.caches.read().get(context_name).cloned()
    }

    pub fn database_names(&self) -> Vec<String> {
        self.databases.read().keys().cloned().collect()
    }

    pub fn cache_names(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }

    pub fn databases(&self) -> Vec<DatabaseConfig> {
        self.databases.read().values().cloned().collect()
    }

    pub fn caches(&self) -> Vec<CacheConfig> {
        self.caches.read().values().cloned().collect()
    }

    /// 整表诊断输出
    pub fn describe(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("api_config".into(), Value::Object(self.api.read().describe()));
        out.insert("log_config".into(), Value::Object(self.log.read().describe()));

        let dbs: Map<String, Value> = self
            .databases
            .read()
            .iter()
            .map(|(name, cfg)| (name.clone(), Value::Object(cfg.describe())))
            .collect();
        out.insert("db_configs".into(), Value::Object(dbs));

        let caches: Map<String, Value> = self
            .caches
            .read()
            .iter()
            .map(|(name, cfg)| (name.clone(), Value::Object(cfg.describe())))
            .collect();
        out.insert("redis_configs".into(), Value::Object(caches));
        out
    }
}

/// 提取一个配置段，段缺失时回落到默认值
fn section<T>(figment: &Figment, key: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match figment.find_value(key) {
        Ok(_) => Ok(figment.extract_inner(key)?),
        Err(_) => Ok(T::default()),
    }
}
