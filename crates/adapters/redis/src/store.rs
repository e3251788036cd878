//! 缓存命令门面

use std::time::Duration;

use armature_config::CacheConfig;
use armature_errors::{AppError, AppResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

/// 已就绪的缓存连接及其配置
///
/// ConnectionManager 自身可克隆复用，命令失败时按配置的退避参数
/// 自动重连。
#[derive(Clone)]
pub struct CacheStore {
    conn: ConnectionManager,
    config: CacheConfig,
}

impl CacheStore {
    pub(crate) fn new(conn: ConnectionManager, config: CacheConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// 门面未覆盖的命令直接拿管理器克隆执行
    pub fn command(&self) -> ConnectionManager {
        self.conn.clone()
    }

    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| AppError::cache(format!("redis ping failed: {e}")))?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| AppError::cache(format!("redis get failed: {e}")))
    }

    /// 写入键值，ttl 为 None 时不过期
    ///
    /// 过期粒度为整秒，不足 1 秒按 1 秒处理（SETEX/EXPIRE 不接受 0）。
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => conn
                .set_ex(key, value, ttl_secs(ttl))
                .await
                .map_err(|e| AppError::cache(format!("redis set failed: {e}"))),
            None => conn
                .set(key, value)
                .await
                .map_err(|e| AppError::cache(format!("redis set failed: {e}"))),
        }
    }

    /// 删除键，返回是否存在过
    pub async fn delete(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| AppError::cache(format!("redis delete failed: {e}")))?;
        Ok(removed > 0)
    }

    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key)
            .await
            .map_err(|e| AppError::cache(format!("redis exists failed: {e}")))
    }

    /// 重置键的过期时间（整秒粒度），返回键是否存在
    pub async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        conn.expire(key, ttl_secs(ttl) as i64)
            .await
            .map_err(|e| AppError::cache(format!("redis expire failed: {e}")))
    }

    /// ConnectionManager 没有显式关闭，丢弃前记录即可
    pub fn close(&self) {
        info!(context = %self.config.context_name, "redis connection released");
    }
}

/// 过期时长换算为整秒，下限 1 秒
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_floors_to_one_second() {
        assert_eq!(ttl_secs(Duration::from_millis(50)), 1);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(30)), 30);
    }
}
