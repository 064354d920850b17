// src/bin/api_server.rs

use myfit_store::infra::{config, logging};
use myfit_store::transport;
use myfit_store::{Collections, ModelRegistry};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_tracing();

    let data_dir = config::data_dir();
    let bind_addr = config::bind_addr()?;

    // --- Collections (creates `[]` files on first start) ---
    let registry = ModelRegistry::with_defaults();
    let collections = Collections::open(&data_dir, &registry)?;
    let absolute = std::fs::canonicalize(&data_dir).unwrap_or_else(|_| data_dir.clone());
    info!(data_dir = %absolute.display(), collections = ?registry.list_models(), "collections ready");

    // --- API Server ---
    let app_state = transport::http::AppState::new(collections);
    let app = transport::http::create_router(app_state).merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
    );
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("API server listening on http://{}", listener.local_addr()?);
    info!("Swagger UI available at http://{}/swagger-ui", listener.local_addr()?);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("shutdown signal received");
        }
    }

    Ok(())
}
