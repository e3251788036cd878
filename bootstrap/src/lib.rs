//! armature-bootstrap - 统一服务启动骨架
//!
//! 配置加载、连接建立与 HTTP 生命周期，所有服务复用的启动逻辑

mod context;
mod http;
mod resources;
mod runtime;
mod shutdown;

pub use context::{AppState, RequestContext};
pub use http::HealthCheckFn;
pub use resources::ResourceRegistry;
pub use runtime::{RuntimeState, ServiceRuntime};
pub use shutdown::{shutdown_signal, ShutdownController};

// 处理器直接使用的路由构造器
pub use axum::routing::{delete, get, patch, post, put};
