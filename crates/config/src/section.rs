//! 配置段的共享契约

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{ApiConfig, CacheConfig, ConfigError, DatabaseConfig, LogConfig};

/// 配置段契约
///
/// `bind` 可重复调用，第二次及以后为 no-op（通过内部 bound 标记保证，
/// 已做过单位换算的字段不会被再次换算）。`validate` 返回第一个被违反的约束。
pub trait ConfigSection {
    /// 原地填充默认值、归一化字符串与时间单位
    fn bind(&mut self) -> Result<(), ConfigError>;

    /// 纯校验，不做任何修改；调用前必须先 bind
    fn validate(&self) -> Result<(), ConfigError>;

    /// 无脱敏的诊断输出
    fn describe(&self) -> Map<String, Value>;
}

/// 将可序列化的配置段转成 map
pub(crate) fn to_map<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// 四种配置段的和类型
#[derive(Debug, Clone)]
pub enum Section {
    Api(ApiConfig),
    Log(LogConfig),
    Database(DatabaseConfig),
    Cache(CacheConfig),
}

impl ConfigSection for Section {
    fn bind(&mut self) -> Result<(), ConfigError> {
        match self {
            Section::Api(cfg) => cfg.bind(),
            Section::Log(cfg) => cfg.bind(),
            Section::Database(cfg) => cfg.bind(),
            Section::Cache(cfg) => cfg.bind(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Section::Api(cfg) => cfg.validate(),
            Section::Log(cfg) => cfg.validate(),
            Section::Database(cfg) => cfg.validate(),
            Section::Cache(cfg) => cfg.validate(),
        }
    }

    fn describe(&self) -> Map<String, Value> {
        match self {
            Section::Api(cfg) => cfg.describe(),
            Section::Log(cfg) => cfg.describe(),
            Section::Database(cfg) => cfg.describe(),
            Section::Cache(cfg) => cfg.describe(),
        }
    }
}
