use std::sync::Arc;

use retailerp_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    retailerp_observability::init();

    let config = AppConfig::load()?;
    let services = Arc::new(retailerp_api::app::services::AppServices::connect(&config).await?);
    let app = retailerp_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
