//! 服务入口

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cixuan::config::AppConfig;
use cixuan::lexical::JiebaFilter;
use cixuan::provider::build_active_provider;
use cixuan::service::TranslateService;
use cixuan::storage::Store;
use cixuan::web::{create_routes, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // `cixuan --init-config` 在当前目录生成示例配置后退出
    if std::env::args().nth(1).as_deref() == Some("--init-config") {
        AppConfig::generate_example_config("cixuan.toml")?;
        tracing::info!("已生成示例配置文件: cixuan.toml");
        return Ok(());
    }

    let config = AppConfig::load()?;
    let provider = build_active_provider(&config)?;

    // 存储打开失败时降级为内存模式，服务照常启动
    let store = Arc::new(Store::open_or_memory(Path::new(&config.data_dir)));

    let filter = Arc::new(JiebaFilter::new());
    let service = TranslateService::new(store, filter, provider);

    let listen = config.listen.clone();
    let state = Arc::new(AppState { config, service });
    let app = create_routes(state);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    tracing::info!("翻译服务启动: http://{}", listen);

    axum::serve(listener, app).await?;
    Ok(())
}
