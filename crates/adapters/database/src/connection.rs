//! 带有界重试的数据库连接工厂

use std::time::Duration;

use armature_config::{DatabaseConfig, DatabaseProvider};
use armature_errors::{AppError, AppResult};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::dsn::build_dsn;
use crate::pool::DatabasePool;

/// 打开连接数上限为 0 时的兜底值
const FALLBACK_MAX_OPEN_CONNS: u32 = 10;

/// 重试间隔固定 1 秒
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// 已就绪的数据库连接及其配置
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    pool: DatabasePool,
    config: DatabaseConfig,
}

impl DatabaseStore {
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.pool.ping().await
    }

    /// 按配置顺序执行初始化脚本，任一脚本失败即终止
    pub async fn run_initial_scripts(&self) -> AppResult<()> {
        for path in &self.config.initial_scripts {
            let sql = std::fs::read_to_string(path)
                .map_err(|e| AppError::script(path.clone(), e.to_string()))?;
            self.pool
                .execute_script(&sql)
                .await
                .map_err(|e| AppError::script(path.clone(), e.to_string()))?;
            info!(context = %self.config.context_name, script = %path, "initial script executed");
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// 建立数据库连接
///
/// 连接串先于重试循环拼装，配置类错误不消耗重试预算。每次尝试为
/// 建池加一次存活探测；探测失败的池先关闭再进入下一轮，轮与轮之间
/// 固定间隔 1 秒。预算耗尽返回终态错误，调用方不应再次重试。
pub async fn connect(config: &DatabaseConfig) -> AppResult<DatabaseStore> {
    let provider = config
        .provider()
        .ok_or_else(|| AppError::config(format!("unknown database provider [{}]", config.provider)))?;
    let dsn = build_dsn(provider, config)?;

    let limit = config.retry_limits.max(1);
    for attempt in 1..=limit {
        match open_pool(provider, config, &dsn).await {
            Ok(pool) => match pool.ping().await {
                Ok(()) => {
                    info!(
                        context = %config.context_name,
                        provider = %provider.as_str(),
                        attempt,
                        "database connection established"
                    );
                    let store = DatabaseStore {
                        pool,
                        config: config.clone(),
                    };
                    // 脚本失败是终态，不回到重试循环
                    if let Err(e) = store.run_initial_scripts().await {
                        store.close().await;
                        return Err(e);
                    }
                    return Ok(store);
                }
                Err(e) => {
                    warn!(
                        context = %config.context_name,
                        attempt,
                        limit,
                        error = %e,
                        "database ping failed, retrying"
                    );
                    // 探测失败的池不能带入下一轮
                    pool.close().await;
                }
            },
            Err(e) => {
                warn!(
                    context = %config.context_name,
                    attempt,
                    limit,
                    error = %e,
                    "database connection failed, retrying"
                );
            }
        }
        if attempt < limit {
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    Err(AppError::retry_exceeded(config.context_name.clone(), limit))
}

async fn open_pool(
    provider: DatabaseProvider,
    config: &DatabaseConfig,
    dsn: &str,
) -> AppResult<DatabasePool> {
    let max_open = if config.max_open_conns == 0 {
        FALLBACK_MAX_OPEN_CONNS
    } else {
        config.max_open_conns
    };
    match provider {
        DatabaseProvider::Postgres => {
            let pool = PgPoolOptions::new()
                .min_connections(config.max_idle_conns)
                .max_connections(max_open)
                .max_lifetime(config.max_lifetime())
                .acquire_timeout(RETRY_INTERVAL)
                .connect(dsn)
                .await
                .map_err(|e| AppError::connection(e.to_string()))?;
            Ok(DatabasePool::Postgres(pool))
        }
        DatabaseProvider::MySql => {
            let pool = MySqlPoolOptions::new()
                .min_connections(config.max_idle_conns)
                .max_connections(max_open)
                .max_lifetime(config.max_lifetime())
                .acquire_timeout(RETRY_INTERVAL)
                .connect(dsn)
                .await
                .map_err(|e| AppError::connection(e.to_string()))?;
            Ok(DatabasePool::MySql(pool))
        }
    }
}
