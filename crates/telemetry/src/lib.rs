//! armature-telemetry - 可观测性库

use std::fs::OpenOptions;
use std::sync::Mutex;

use armature_config::{LogConfig, LogLevel};
use armature_errors::{AppError, AppResult};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 配置级别到 tracing 过滤级别的映射
///
/// panic / dpanic / fatal 没有 tracing 对应级别，统一收敛到 error。
pub fn tracing_level(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error | LogLevel::Panic | LogLevel::Dpanic | LogLevel::Fatal => "error",
    }
}

/// 按日志配置初始化 tracing
///
/// 始终输出到 stdout；配置了 file_location 时追加写入该文件。
/// 轮转参数（max_size / max_backups / max_age）随配置携带，由
/// 部署侧的轮转工具消费。
pub fn init_logging(config: &LogConfig) -> AppResult<()> {
    let level = tracing_level(config.log_level());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    if config.file_enabled() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file_location)
            .map_err(|e| {
                AppError::internal(format!(
                    "failed to open log file [{}]: {e}",
                    config.file_location
                ))
            })?;
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .try_init()
            .map_err(|e| AppError::internal(format!("failed to init tracing: {e}")))?;
    } else {
        registry
            .try_init()
            .map_err(|e| AppError::internal(format!("failed to init tracing: {e}")))?;
    }
    Ok(())
}

/// 初始化 tracing（仅 stdout，按级别字符串）
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 初始化 Prometheus metrics
pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}
