use std::net::SocketAddr;

use anyhow::Context;

use cartline_infra::{AppConfig, Environment};
use cartline_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("invalid configuration")?;

    cartline_observability::init_with(match config.env {
        Environment::Development => LogFormat::Compact,
        Environment::Test | Environment::Production => LogFormat::Json,
    });
    tracing::info!(?config, "starting cartline-api");

    let app = cartline_api::app::build_app(&config)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}
