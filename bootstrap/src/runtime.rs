//! 服务运行时
//!
//! 配置加载、资源连接、HTTP 服务与优雅退出的单向生命周期

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use armature_adapter_database::DatabaseStore;
use armature_adapter_redis::CacheStore;
use armature_config::{ApiConfig, ConfigRegistry, LogConfig};
use armature_errors::{AppError, AppResult};
use armature_telemetry::init_logging;
use axum::routing::MethodRouter;
use axum::Router;
use axum_server::Handle;
use tracing::{error, info, warn};

use crate::context::AppState;
use crate::http::{build_router, serve_http, serve_https, HealthCheckFn, DRAIN_GRACE};
use crate::resources::ResourceRegistry;
use crate::shutdown::{shutdown_signal, ShutdownController};

/// 运行时状态，只会单向推进
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Created,
    Configured,
    Connected,
    Serving,
    Draining,
    Stopped,
}

type CleanupHook = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = AppResult<()>> + Send>> + Send>;

/// 服务运行时
///
/// 一次性对象：from_file -> connect -> serve，serve 返回即 Stopped。
/// 连接失败后运行时不可复用，调用方据此退出进程。
pub struct ServiceRuntime {
    config: Arc<ConfigRegistry>,
    resources: Option<Arc<ResourceRegistry>>,
    router: Router<AppState>,
    health_checks: Vec<HealthCheckFn>,
    cleanup_hooks: Vec<CleanupHook>,
    shutdown: ShutdownController,
    state: RuntimeState,
}

impl ServiceRuntime {
    /// 加载配置并安装默认日志器
    pub fn from_file(path: &str) -> AppResult<Self> {
        Self::with_logger(path, |log_config| init_logging(log_config))
    }

    /// 加载配置，日志器由调用方注入
    ///
    /// 测试或嵌入场景下调用方可能已经装好 subscriber，此时注入一个
    /// no-op 即可，不存在需要绕开的全局单例。
    pub fn with_logger<L>(path: &str, logger: L) -> AppResult<Self>
    where
        L: FnOnce(&LogConfig) -> AppResult<()>,
    {
        let mut runtime = Self {
            config: Arc::new(ConfigRegistry::load(path)?),
            resources: None,
            router: Router::new(),
            health_checks: Vec::new(),
            cleanup_hooks: Vec::new(),
            shutdown: ShutdownController::new(),
            state: RuntimeState::Created,
        };
        logger(&runtime.config.log())?;
        runtime.state = RuntimeState::Configured;
        info!("runtime configured");
        Ok(runtime)
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn config(&self) -> &ConfigRegistry {
        &self.config
    }

    pub fn api_config(&self) -> ApiConfig {
        self.config.api()
    }

    /// 非请求路径下的资源查找
    pub fn db(&self, context_name: &str) -> Option<Arc<DatabaseStore>> {
        self.resources.as_ref().and_then(|r| r.database(context_name))
    }

    pub fn cache(&self, context_name: &str) -> Option<Arc<CacheStore>> {
        self.resources.as_ref().and_then(|r| r.cache(context_name))
    }

    /// 建立全部数据库与缓存连接
    pub async fn connect(&mut self) -> AppResult<()> {
        self.expect_state(RuntimeState::Configured)?;
        let resources = ResourceRegistry::connect_all(&self.config).await?;
        self.resources = Some(Arc::new(resources));
        self.state = RuntimeState::Connected;
        info!("runtime connected");
        Ok(())
    }

    /// 挂载用户路由
    pub fn route(&mut self, path: &str, method_router: MethodRouter<AppState>) -> &mut Self {
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self
    }

    /// 注册健康检查探针，按注册顺序执行
    pub fn on_health_check<F, Fut>(&mut self, check: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.health_checks.push(Arc::new(move || {
            Box::pin(check()) as Pin<Box<dyn Future<Output = AppResult<()>> + Send>>
        }));
        self
    }

    /// 注册关闭期清理钩子，按注册顺序执行，单个失败不影响后续
    pub fn on_cleanup<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.cleanup_hooks.push(Box::new(move || {
            Box::pin(hook()) as Pin<Box<dyn Future<Output = AppResult<()>> + Send>>
        }));
        self
    }

    /// 显式触发关闭
    pub fn stop(&self) {
        self.shutdown.shutdown();
    }

    /// 关闭控制器句柄，可跨任务触发 stop
    pub fn shutdown_handle(&self) -> ShutdownController {
        self.shutdown.clone()
    }

    /// 启动监听并阻塞到退出
    ///
    /// https_only 时不开明文监听；ssl_enable 时加开 TLS 监听。收到
    /// 终止信号或 stop() 后进入排水期，在宽限期内等待在途请求，随后
    /// 依次执行清理钩子、关闭全部资源。
    pub async fn serve(mut self) -> AppResult<()> {
        self.expect_state(RuntimeState::Connected)?;
        let resources = self
            .resources
            .clone()
            .ok_or_else(|| AppError::internal("resources not connected"))?;

        let api = self.config.api();
        let state = AppState::new(self.config.clone(), resources.clone());
        let checks = Arc::new(std::mem::take(&mut self.health_checks));
        let router = build_router(
            std::mem::take(&mut self.router),
            state,
            &api.health_check_endpoint,
            checks,
        );

        let mut handles: Vec<Handle> = Vec::new();
        let mut listeners: Vec<tokio::task::JoinHandle<std::io::Result<()>>> = Vec::new();

        if !api.https_only {
            let addr = SocketAddr::from(([0, 0, 0, 0], api.port));
            let handle = Handle::new();
            handles.push(handle.clone());
            let router = router.clone();
            let shutdown = self.shutdown.clone();
            listeners.push(tokio::spawn(async move {
                let result = serve_http(addr, handle, router).await;
                if let Err(e) = &result {
                    error!(error = %e, "http listener failed");
                    shutdown.shutdown();
                }
                result
            }));
        }

        if api.ssl_enable {
            let addr = SocketAddr::from(([0, 0, 0, 0], api.ssl_port));
            let handle = Handle::new();
            handles.push(handle.clone());
            let router = router.clone();
            let shutdown = self.shutdown.clone();
            let cert_file = api.ssl_cert_file.clone();
            let key_file = api.ssl_key_file.clone();
            listeners.push(tokio::spawn(async move {
                let result = serve_https(addr, &cert_file, &key_file, handle, router).await;
                if let Err(e) = &result {
                    error!(error = %e, "https listener failed");
                    shutdown.shutdown();
                }
                result
            }));
        }

        if listeners.is_empty() {
            return Err(AppError::config(
                "no listener enabled: https_only is set but ssl_enable is not",
            ));
        }

        self.state = RuntimeState::Serving;
        info!(port = api.port, ssl = api.ssl_enable, "service serving");

        tokio::select! {
            _ = shutdown_signal() => {},
            _ = self.shutdown.wait() => {},
        }

        self.state = RuntimeState::Draining;
        info!(grace_secs = DRAIN_GRACE.as_secs(), "service draining");
        for handle in &handles {
            handle.graceful_shutdown(Some(DRAIN_GRACE));
        }
        // 监听器自身的失败（如端口被占）必须带出 serve
        let mut listen_error: Option<std::io::Error> = None;
        for listener in listeners {
            match listener.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => listen_error = listen_error.or(Some(e)),
                Err(e) => warn!(error = %e, "listener task join failed"),
            }
        }

        self.run_cleanup_hooks().await;
        resources.close_all().await;

        self.state = RuntimeState::Stopped;
        if let Some(e) = listen_error {
            return Err(AppError::connection(format!("listener failed: {e}")));
        }
        info!("service stopped");
        Ok(())
    }

    /// 按注册顺序执行清理钩子，单个失败记 warning 后继续
    pub(crate) async fn run_cleanup_hooks(&mut self) {
        for hook in self.cleanup_hooks.drain(..) {
            if let Err(e) = hook().await {
                warn!(error = %e, "cleanup hook failed");
            }
        }
    }

    fn expect_state(&self, expected: RuntimeState) -> AppResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AppError::internal(format!(
                "invalid runtime state: expected {expected:?}, got {:?}",
                self.state
            )))
        }
    }
}
