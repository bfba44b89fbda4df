use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};

use bom_explosion as api;
use api::config::{AppConfig, CatalogBackend};
use api::repositories::{BomNodeResolver, DatabaseBomResolver, InMemoryBomStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let catalog = build_catalog(&cfg).await?;
    if let Err(err) = catalog.health_check().await {
        warn!("Catalog is not reachable at startup: {}", err);
    }

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cfg.host, cfg.port))?;

    let app = api::build_router(api::AppState::new(cfg, catalog));

    info!("bom-explosion listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn build_catalog(cfg: &AppConfig) -> anyhow::Result<Arc<dyn BomNodeResolver>> {
    match cfg.catalog_backend() {
        CatalogBackend::InMemory => {
            let store = match &cfg.catalog_seed_path {
                Some(path) => InMemoryBomStore::load_file(path)
                    .with_context(|| format!("failed to load catalog seed {}", path))?,
                None => {
                    warn!("No catalog_seed_path configured; starting with an empty in-memory catalog");
                    InMemoryBomStore::new()
                }
            };
            info!(
                "Using in-memory catalog with {} parts and {} links",
                store.part_count(),
                store.link_count()
            );
            Ok(Arc::new(store))
        }
        CatalogBackend::Database => {
            let pool = api::db::establish_connection(&api::db::DbConfig::from(cfg))
                .await
                .context("failed to connect to catalog database")?;
            if cfg.auto_create_schema {
                api::db::create_schema(&pool).await.map_err(|e| {
                    error!("Failed creating catalog schema: {}", e);
                    e
                })?;
            }
            info!("Using database catalog");
            Ok(Arc::new(DatabaseBomResolver::new(Arc::new(pool))))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
