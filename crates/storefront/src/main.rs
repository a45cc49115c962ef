//! Tity Creations storefront.
//!
//! Serves the catalog, carts, checkout and account pages on port 3000.
//!
//! # Backends
//!
//! - Firestore when `FIRESTORE_PROJECT_ID` is set, falling back to
//!   `PostgreSQL` if a database URL is also configured
//! - `PostgreSQL` alone when only a database URL is configured
//! - An in-memory demo catalog otherwise
//!
//! Sessions are stored in `PostgreSQL` when a database URL is configured
//! and in memory otherwise.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use sqlx::PgPool;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tity_storefront::config::{StorefrontConfig, describe_secret};
use tity_storefront::db::fallback::FallbackRepository;
use tity_storefront::db::memory::MemoryProductRepository;
use tity_storefront::db::postgres::PgProductRepository;
use tity_storefront::db::{self, ProductRepository};
use tity_storefront::firestore::FirestoreRepository;
use tity_storefront::middleware::create_session_layer;
use tity_storefront::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Pick the product backend from the configuration.
fn select_repository(
    config: &StorefrontConfig,
    pool: Option<&PgPool>,
) -> Arc<dyn ProductRepository> {
    let relational = pool.map(|pool| {
        Arc::new(PgProductRepository::new(pool.clone())) as Arc<dyn ProductRepository>
    });

    match (&config.firestore, relational) {
        (Some(firestore), relational) => {
            let primary: Arc<dyn ProductRepository> = Arc::new(
                FirestoreRepository::new(firestore).expect("Failed to create Firestore client"),
            );
            tracing::info!(
                project = %firestore.project_id,
                emulator = firestore.emulator_host.as_deref().unwrap_or("none"),
                access_token = describe_secret(firestore.access_token.as_ref()),
                "Using Firestore backend"
            );
            match relational {
                Some(fallback) => {
                    tracing::info!("PostgreSQL fallback enabled");
                    Arc::new(FallbackRepository::new(primary, fallback))
                }
                None => primary,
            }
        }
        (None, Some(relational)) => {
            tracing::info!("Using PostgreSQL backend");
            relational
        }
        (None, None) => {
            tracing::warn!("No backend configured, serving the in-memory demo catalog");
            Arc::new(MemoryProductRepository::with_demo_catalog())
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tity_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    tracing::info!(
        database_url = describe_secret(config.database_url.as_ref()),
        "Configuration loaded"
    );

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p tity-cli -- migrate
    let pool = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");
            Some(pool)
        }
        None => None,
    };

    let repo = select_repository(&config, pool.as_ref());
    let state = AppState::new(config.clone(), repo);
    let secure = config.is_secure();

    let app = match pool {
        Some(pool) => {
            let store = PostgresStore::new(pool);
            tity_storefront::app(state, create_session_layer(store, secure))
        }
        None => {
            tracing::warn!("Sessions are kept in memory and lost on restart");
            tity_storefront::app(state, create_session_layer(MemoryStore::default(), secure))
        }
    }
    // Sentry layers (outermost for full request coverage)
    .layer(sentry_tower::NewSentryLayer::new_from_top())
    .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
