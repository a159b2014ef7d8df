mod components;
mod config;
mod error;
mod feed;
mod helpers;
mod middleware;
mod models;
mod routes;
mod schema;
mod services;

use std::sync::Arc;

use anyhow::anyhow;
use axum::http::header;
use diesel::Connection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::deadpool::{Hook, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::*;
use tracing_forest::ForestLayer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::tracing::HttpTracingExt;
use crate::config::{AppCfg, StoreKind};
use crate::middleware::cors::CorsExt;
use crate::middleware::logging::HttpLoggingExt;
use crate::routes::AppState;
use crate::services::media::LocalMediaStore;
use crate::services::memory::MemoryStore;
use crate::services::{ForumServiceDb, Store};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_http_tracing()
        .with(ForestLayer::default())
        .init();

    let cfg = AppCfg::load()?;
    info!(store = ?cfg.store, listen_addr = %cfg.listen_addr, "configuration loaded");

    match cfg.store {
        StoreKind::Postgres => {
            let url = cfg
                .database_url
                .clone()
                .ok_or_else(|| anyhow!("database_url is not set"))?;
            run_migrations(url.clone()).await?;

            let mgr = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
            info!(max_size = cfg.pool_size, "starting DB pool");
            let pool = Pool::builder(mgr)
                .max_size(cfg.pool_size)
                .post_create(Hook::async_fn(|_conn, metrics| {
                    trace!(?metrics, "db connection created");
                    Box::pin(std::future::ready(Ok(())))
                }))
                .runtime(deadpool::Runtime::Tokio1)
                .build()?;

            serve(&cfg, ForumServiceDb::new(pool)).await
        }
        StoreKind::Memory => {
            warn!("using the in-memory store; nothing survives a restart");
            serve(&cfg, MemoryStore::new()).await
        }
    }
}

/// Applies pending migrations over a blocking wrapper around the async
/// connection.
async fn run_migrations(url: String) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&url)?;
        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
        info!(count = applied.len(), "migrations applied");
        Ok(())
    })
    .await?
}

async fn serve<S: Store>(cfg: &AppCfg, store: S) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&cfg.media_dir).await?;
    let media = Arc::new(LocalMediaStore::new(&cfg.media_dir, &cfg.media_base_url));
    let state = AppState::new(store, media, cfg.feed.clone());

    let app = routes::router(state)
        .nest_service(
            "/media",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    header::HeaderValue::from_static("max-age=86400"),
                ))
                .layer(CompressionLayer::new())
                .service(ServeDir::new(&cfg.media_dir)),
        )
        .with_cors(&cfg.allowed_origins)
        .with_http_logging();

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!("starting listening at {}", cfg.listen_addr);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
