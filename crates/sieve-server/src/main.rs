use std::sync::Arc;

use clap::Parser;
use sieve_server::adapter::StoreGateway;
use sieve_server::cli::{Cli, Command};
use sieve_server::config::{AppConfig, LogFormat, StoreBackend};
use sieve_server::metrics::Metrics;
use sieve_server::rest;
use sieve_server::service::AccessService;
use sieve_server::telemetry::{self, TelemetryProvider};
use sieve_storage::{InMemoryStore, PostgresStore, RelationshipStore};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging(config: &AppConfig) -> Option<TelemetryProvider> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    // OTel layer is typed to bare Registry, so it must be added first.
    let registry = tracing_subscriber::registry();

    let otel_provider = telemetry::init_telemetry(&config.tracing);

    #[cfg(feature = "telemetry")]
    let registry = registry.with(otel_provider.as_ref().map(telemetry::make_otel_layer));

    let registry = registry.with(filter);

    match config.log.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer().json();
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer().pretty();
            registry.with(fmt_layer).init();
        }
    }

    if otel_provider.is_some() {
        tracing::info!("OpenTelemetry tracing enabled");
    }

    otel_provider
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let otel_provider = init_logging(&config);

    let result = match cli.command {
        Some(Command::Migrate) => run_migrate(&config).await,
        Some(Command::Serve) | None => run_serve(config).await,
    };

    if let Some(provider) = otel_provider {
        telemetry::shutdown_telemetry(provider);
    }
    result
}

async fn connect_pool(config: &AppConfig) -> Result<sqlx::PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.store_timeout())
        .connect(&config.database.url)
        .await
}

async fn run_migrate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("running database migrations");
    let pool = connect_pool(config).await?;
    sieve_storage::postgres::migrations::run_migrations(&pool).await?;
    tracing::info!("migrations completed successfully");
    Ok(())
}

async fn run_serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, grants are lost on restart");
            serve(config, InMemoryStore::new()).await
        }
        StoreBackend::Postgres => {
            let pool = connect_pool(&config).await?;
            sieve_storage::postgres::migrations::run_migrations(&pool).await?;
            serve(config, PostgresStore::new(pool)).await
        }
    }
}

async fn serve<S>(config: AppConfig, store: S) -> Result<(), Box<dyn std::error::Error>>
where
    S: RelationshipStore + 'static,
{
    let http_addr: std::net::SocketAddr = config.http_addr().parse()?;
    tracing::info!(
        %http_addr,
        backend = ?config.store.backend,
        timeout_ms = config.store.timeout_ms,
        "starting sieve server"
    );

    let gateway = Arc::new(StoreGateway::new(Arc::new(store), config.store_timeout()));
    let metrics = Arc::new(Metrics::new());
    let service = Arc::new(
        AccessService::new(gateway, config.to_engine_config()).with_metrics(Arc::clone(&metrics)),
    );

    let router = rest::create_router(rest::AppState {
        service,
        metrics: Arc::clone(&metrics),
    });

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    tracing::info!(%http_addr, "HTTP server listening");

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "HTTP server error");
    }

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => { tracing::info!("received SIGINT"); }
                _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to register SIGTERM handler, using SIGINT only");
            let _ = ctrl_c.await;
            tracing::info!("received SIGINT");
        }
    }
}
