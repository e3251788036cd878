//! 日志配置

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::section::{ConfigSection, to_map};
use crate::ConfigError;

const DEFAULT_LOG_MAX_SIZE: i64 = 500;
const DEFAULT_LOG_MAX_BACKUPS: i64 = 3;
const DEFAULT_LOG_MAX_AGE: i64 = 30;

/// 日志级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    Panic,
    Dpanic,
    Fatal,
}

impl LogLevel {
    /// 解析级别字符串，未识别的值静默回落到 debug
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "panic" => LogLevel::Panic,
            "dpanic" => LogLevel::Dpanic,
            "fatal" => LogLevel::Fatal,
            _ => LogLevel::Debug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Panic => "panic",
            LogLevel::Dpanic => "dpanic",
            LogLevel::Fatal => "fatal",
        }
    }
}

/// 日志配置（`[log_config]` 段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 日志文件位置，空表示仅输出到 stdout
    pub file_location: String,
    /// 单个日志文件上限（MB）
    pub max_size: i64,
    /// 保留的备份文件数
    pub max_backups: i64,
    /// 备份保留天数
    pub max_age: i64,
    /// 日志级别
    pub level: String,
    #[serde(skip)]
    pub(crate) bound: bool,
}

impl LogConfig {
    /// 绑定后的日志级别
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.level)
    }

    /// 是否输出到文件
    pub fn file_enabled(&self) -> bool {
        !self.file_location.is_empty()
    }
}

impl ConfigSection for LogConfig {
    fn bind(&mut self) -> Result<(), ConfigError> {
        if self.bound {
            return Ok(());
        }
        self.file_location = self.file_location.trim().to_string();
        if self.max_size < 50 {
            self.max_size = DEFAULT_LOG_MAX_SIZE;
        }
        if self.max_backups <= 1 {
            self.max_backups = DEFAULT_LOG_MAX_BACKUPS;
        }
        if self.max_age <= 1 {
            self.max_age = DEFAULT_LOG_MAX_AGE;
        }
        self.level = self.log_level().as_str().to_string();
        self.bound = true;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    fn describe(&self) -> Map<String, Value> {
        to_map(self)
    }
}
