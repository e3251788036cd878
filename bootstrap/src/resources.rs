//! 基础设施资源管理
//!
//! 统一持有全部数据库与缓存连接，按上下文名索引

use std::collections::HashMap;
use std::sync::Arc;

use armature_adapter_database::DatabaseStore;
use armature_adapter_redis::CacheStore;
use armature_config::ConfigRegistry;
use armature_errors::AppResult;
use parking_lot::RwLock;
use tracing::{info, warn};

/// 基础设施资源容器
///
/// 启动期整体建立，之后只有并发读。同名重复注册以后写的为准。
#[derive(Default)]
pub struct ResourceRegistry {
    databases: RwLock<HashMap<String, Arc<DatabaseStore>>>,
    caches: RwLock<HashMap<String, Arc<CacheStore>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按配置建立全部连接
    ///
    /// 先数据库后缓存，逐个顺序建立；任何一个失败则关闭已建立的
    /// 连接并带错返回，不再尝试剩余配置。
    pub async fn connect_all(config: &ConfigRegistry) -> AppResult<Self> {
        let registry = Self::new();

        for db_config in config.databases() {
            match armature_adapter_database::connect(&db_config).await {
                Ok(store) => registry.register_database(store),
                Err(e) => {
                    registry.close_all().await;
                    return Err(e);
                }
            }
        }

        for cache_config in config.caches() {
            match armature_adapter_redis::open(&cache_config).await {
                Ok(store) => registry.register_cache(store),
                Err(e) => {
                    registry.close_all().await;
                    return Err(e);
                }
            }
        }

        info!(
            databases = registry.databases.read().len(),
            caches = registry.caches.read().len(),
            "all resources connected"
        );
        Ok(registry)
    }

    pub fn register_database(&self, store: DatabaseStore) {
        let name = store.config().context_name.clone();
        if self.databases.write().insert(name.clone(), Arc::new(store)).is_some() {
            warn!(context = %name, "database store replaced by re-registration");
        }
    }

    pub fn register_cache(&self, store: CacheStore) {
        let name = store.config().context_name.clone();
        if self.caches.write().insert(name.clone(), Arc::new(store)).is_some() {
            warn!(context = %name, "cache store replaced by re-registration");
        }
    }

    pub fn database(&self, context_name: &str) -> Option<Arc<DatabaseStore>> {
        self.databases.read().get(context_name).cloned()
    }

    pub fn cache(&self, context_name: &str) -> Option<Arc<CacheStore>> {
        self.caches.read().get(context_name).cloned()
    }

    pub fn database_names(&self) -> Vec<String> {
        self.databases.read().keys().cloned().collect()
    }

    pub fn cache_names(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }

    /// 关闭并移除全部连接，关闭失败只记 warning
    pub async fn close_all(&self) {
        let databases: Vec<(String, Arc<DatabaseStore>)> =
            self.databases.write().drain().collect();
        for (name, store) in databases {
            store.close().await;
            info!(context = %name, "database connection closed");
        }

        let caches: Vec<(String, Arc<CacheStore>)> = self.caches.write().drain().collect();
        for (name, store) in caches {
            store.close();
            info!(context = %name, "cache connection released");
        }
    }
}
