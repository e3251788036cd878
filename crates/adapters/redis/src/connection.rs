//! Redis 连接建立

use armature_config::CacheConfig;
use armature_errors::{AppError, AppResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::info;

use crate::store::CacheStore;

const DEFAULT_REDIS_PORT: u16 = 6379;

/// 建立缓存连接
///
/// 缓存连接为单次尝试，命令级重试交给 ConnectionManager 按配置的
/// 退避参数处理。建立后以 PING 确认可用。
pub async fn open(config: &CacheConfig) -> AppResult<CacheStore> {
    let info = connection_info(config)?;
    let client = Client::open(info)
        .map_err(|e| AppError::cache(format!("failed to create redis client: {e}")))?;

    let mut manager_config = ConnectionManagerConfig::new();
    if let Some(retries) = config.retries() {
        manager_config = manager_config.set_number_of_retries(retries as usize);
    }
    if let Some(backoff) = config.max_backoff() {
        manager_config = manager_config.set_max_delay(backoff.as_millis() as u64);
    }
    if let Some(deadline) = config.read_deadline() {
        manager_config = manager_config.set_response_timeout(deadline);
    }
    manager_config = manager_config.set_connection_timeout(config.pool_wait());

    let mut conn = ConnectionManager::new_with_config(client, manager_config)
        .await
        .map_err(|e| AppError::cache(format!("failed to create redis connection manager: {e}")))?;

    redis::cmd("PING")
        .query_async::<String>(&mut conn)
        .await
        .map_err(|e| AppError::cache(format!("redis ping failed: {e}")))?;

    info!(context = %config.context_name, endpoint = %config.endpoint, "redis connection established");
    Ok(CacheStore::new(conn, config.clone()))
}

/// endpoint 形如 host 或 host:port，缺省端口 6379
fn connection_info(config: &CacheConfig) -> AppResult<ConnectionInfo> {
    let (host, port) = match config.endpoint.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| AppError::cache(format!("invalid redis endpoint [{}]", config.endpoint)))?;
            (host.to_string(), port)
        }
        None => (config.endpoint.clone(), DEFAULT_REDIS_PORT),
    };
    if host.is_empty() {
        return Err(AppError::cache(format!(
            "invalid redis endpoint [{}]",
            config.endpoint
        )));
    }

    let password = if config.password.is_empty() {
        None
    } else {
        Some(config.password.clone())
    };

    Ok(ConnectionInfo {
        addr: ConnectionAddr::Tcp(host, port),
        redis: RedisConnectionInfo {
            db: config.db,
            password,
            ..Default::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_with_port() {
        let info = connection_info(&CacheConfig::new("cache1", "10.0.0.5:6380")).unwrap();
        match info.addr {
            ConnectionAddr::Tcp(host, port) => {
                assert_eq!(host, "10.0.0.5");
                assert_eq!(port, 6380);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_defaults_port() {
        let info = connection_info(&CacheConfig::new("cache1", "redis.internal")).unwrap();
        match info.addr {
            ConnectionAddr::Tcp(host, port) => {
                assert_eq!(host, "redis.internal");
                assert_eq!(port, 6379);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_password_and_db_carried() {
        let config = CacheConfig::new("cache1", "localhost").with_password("s3cret").with_db(2);
        let info = connection_info(&config).unwrap();
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_bad_port_rejected() {
        let err = connection_info(&CacheConfig::new("cache1", "localhost:notaport")).unwrap_err();
        assert!(matches!(err, AppError::Cache(_)));
    }
}
