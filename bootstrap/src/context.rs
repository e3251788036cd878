//! 请求上下文
//!
//! 处理器通过 extractor 获得的只读门面，背后是配置注册表与资源注册表

use std::convert::Infallible;
use std::sync::Arc;

use armature_adapter_database::DatabaseStore;
use armature_adapter_redis::CacheStore;
use armature_config::{ApiConfig, CacheConfig, ConfigRegistry, DatabaseConfig, LogConfig};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::resources::ResourceRegistry;

/// 运行时共享状态，路由层以它为 axum state
#[derive(Clone)]
pub struct AppState {
    pub(crate) config: Arc<ConfigRegistry>,
    pub(crate) resources: Arc<ResourceRegistry>,
}

impl AppState {
    pub(crate) fn new(config: Arc<ConfigRegistry>, resources: Arc<ResourceRegistry>) -> Self {
        Self { config, resources }
    }
}

/// 每请求门面
///
/// 只做注册表的只读委托，不复制连接，对并发处理器安全。
#[derive(Clone)]
pub struct RequestContext {
    request_id: String,
    config: Arc<ConfigRegistry>,
    resources: Arc<ResourceRegistry>,
}

impl RequestContext {
    /// 请求 id，取自 x-request-id 头，缺失时现场生成
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn db(&self, context_name: &str) -> Option<Arc<DatabaseStore>> {
        self.resources.database(context_name)
    }

    pub fn cache(&self, context_name: &str) -> Option<Arc<CacheStore>> {
        self.resources.cache(context_name)
    }

    pub fn api_config(&self) -> ApiConfig {
        self.config.api()
    }

    pub fn log_config(&self) -> LogConfig {
        self.config.log()
    }

    pub fn db_config(&self, context_name: &str) -> Option<DatabaseConfig> {
        self.config.database(context_name)
    }

    pub fn cache_config(&self, context_name: &str) -> Option<CacheConfig> {
        self.config.cache(context_name)
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn epoch(&self) -> i64 {
        Utc::now().timestamp()
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            request_id,
            config: state.config.clone(),
            resources: state.resources.clone(),
        })
    }
}
