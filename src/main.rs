//! Binary entry point: parses configuration, wires up the namespace
//! registry, and serves the HTTP/WS API (spec §6).

use clap::Parser;
use monument_api::{build_router, AppState, Registry, RegistryConfig};
use monument_config::Config;
use monument_engine::NamespaceConfig;
use monument_store::NamespaceDefaults;
use monument_world::Visibility;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::parse();

    let registry_config = RegistryConfig {
        data_dir: config.data_dir.clone(),
        busy_timeout: config.store_busy_timeout(),
        defaults: NamespaceDefaults {
            width: config.default_grid_w,
            height: config.default_grid_h,
            epoch: config.default_epoch,
            visibility: Visibility::FullGrid,
            points_enabled: false,
        },
        namespace_config: NamespaceConfig {
            collect_timeout: config.collect_timeout(),
            scoring_interval: config.scoring_interval,
            chat_length: config.default_chat_length,
        },
    };

    let state = AppState::new(
        Registry::new(registry_config),
        config.admin_secret.clone(),
        config.default_chat_length,
        config.default_history_length,
    );
    let app = build_router(state);

    info!(addr = %config.http_addr, "starting monument server");
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
