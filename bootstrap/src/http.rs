//! HTTP 装配层
//!
//! 路由组装、request-id / trace 中间件与监听器，核心语义之外的胶水

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use armature_errors::AppResult;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::context::AppState;

/// 优雅退出宽限期
pub(crate) const DRAIN_GRACE: Duration = Duration::from_secs(10);

/// 健康检查探针，返回 Err 即判定不健康
pub type HealthCheckFn =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = AppResult<()>> + Send>> + Send + Sync>;

/// 组装完整路由
///
/// 用户路由之上挂健康检查端点，再套 request-id 与 trace 中间件。
pub(crate) fn build_router(
    user_router: Router<AppState>,
    state: AppState,
    health_endpoint: &str,
    checks: Arc<Vec<HealthCheckFn>>,
) -> Router {
    user_router
        .route(health_endpoint, get(health_handler).with_state(checks))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// 健康检查处理器
///
/// 依注册顺序执行探针，第一个失败即以 500 返回失败原因。
async fn health_handler(
    State(checks): State<Arc<Vec<HealthCheckFn>>>,
) -> (StatusCode, String) {
    for check in checks.iter() {
        if let Err(e) = check().await {
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    }
    (StatusCode::OK, "ok".to_string())
}

pub(crate) async fn serve_http(
    addr: SocketAddr,
    handle: Handle,
    router: Router,
) -> std::io::Result<()> {
    info!(%addr, "http listener starting");
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
}

pub(crate) async fn serve_https(
    addr: SocketAddr,
    cert_file: &str,
    key_file: &str,
    handle: Handle,
    router: Router,
) -> std::io::Result<()> {
    let tls = RustlsConfig::from_pem_file(cert_file, key_file).await?;
    info!(%addr, "https listener starting");
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(router.into_make_service())
        .await
}
