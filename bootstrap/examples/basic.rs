//! 最小服务示例
//!
//! ```text
//! cargo run --example basic -- config/service.toml
//! ```

use armature_bootstrap::{get, RequestContext, ServiceRuntime};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "config/service".to_string());

    let mut runtime = ServiceRuntime::from_file(&path)?;
    runtime.connect().await?;

    runtime.route(
        "/whoami",
        get(|ctx: RequestContext| async move { format!("request {}", ctx.request_id()) }),
    );
    runtime.on_health_check(|| async { Ok(()) });

    runtime.serve().await?;
    Ok(())
}
