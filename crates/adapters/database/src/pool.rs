//! 按提供方分派的连接池

use armature_config::DatabaseProvider;
use armature_errors::{AppError, AppResult};
use sqlx::mysql::MySqlPool;
use sqlx::postgres::PgPool;

/// 数据库连接池
///
/// 池本身可被多个请求并发使用，并发控制由驱动的池实现负责。
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Postgres(PgPool),
    MySql(MySqlPool),
}

impl DatabasePool {
    pub fn provider(&self) -> DatabaseProvider {
        match self {
            DatabasePool::Postgres(_) => DatabaseProvider::Postgres,
            DatabasePool::MySql(_) => DatabaseProvider::MySql,
        }
    }

    /// 存活探测
    pub async fn ping(&self) -> AppResult<()> {
        match self {
            DatabasePool::Postgres(pool) => sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| AppError::database(format!("ping failed: {e}"))),
            DatabasePool::MySql(pool) => sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| AppError::database(format!("ping failed: {e}"))),
        }
    }

    /// 执行可能包含多条语句的脚本
    pub async fn execute_script(&self, sql: &str) -> AppResult<()> {
        match self {
            DatabasePool::Postgres(pool) => sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| AppError::database(format!("script execution failed: {e}"))),
            DatabasePool::MySql(pool) => sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| AppError::database(format!("script execution failed: {e}"))),
        }
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::Postgres(pool) => pool.close().await,
            DatabasePool::MySql(pool) => pool.close().await,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            DatabasePool::Postgres(pool) => pool.is_closed(),
            DatabasePool::MySql(pool) => pool.is_closed(),
        }
    }
}
