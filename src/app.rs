/*
 * Responsibility
 * - Config -> dependencies (pool, codecs, gate, stores) -> Router
 * - Logging (console + rotated files), panic hook
 * - App-wide layers (http / cors / security headers), rate limit on /api/v1
 * - Static /uploads, 404 fallback
 * - axum::serve()
 */
use std::{net::SocketAddr, panic, path::Path, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::services::ServeDir;
use tracing_appender::{
    non_blocking,
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::repos::user_repo::PgCredentialStore;
use crate::services::{
    auth::{build_auth_gate, build_token_codec},
    id_codec::IdCodec,
    password::PasswordHasher,
    upload::UploadStore,
};
use crate::state::AppState;

/// Console output (pretty in development, JSON in production) plus, when `LOG_DIR` is
/// set, daily-rotated `combined.log` and error-only `error.log` files.
///
/// The returned guards flush the file writers and must live as long as the server.
fn init_tracing(config: &Config) -> Result<Vec<WorkerGuard>> {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,blog_api=debug,tower_http=debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    let console = if config.app_env.is_production() {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().pretty().boxed()
    };

    let mut guards = Vec::new();
    let mut files = None;
    if let Some(dir) = &config.log_dir {
        let (combined, combined_guard) = non_blocking(log_file(dir, "combined")?);
        let (errors, errors_guard) = non_blocking(log_file(dir, "error")?);
        guards.extend([combined_guard, errors_guard]);

        files = Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(combined)
                .and_then(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(errors)
                        .with_filter(LevelFilter::ERROR),
                ),
        );
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(files)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(guards)
}

fn log_file(dir: &Path, name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(name)
        .filename_suffix("log")
        .max_log_files(5)
        .build(dir)
        .with_context(|| format!("failed to open {name} log in {}", dir.display()))
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash loudly; production: default hook, keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let _log_guards = init_tracing(&config)?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting blog API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    // peer addresses feed the per-client rate limit
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run database migrations")?;

    let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)
        .context("invalid sqids configuration")?;

    let uploads = UploadStore::new(config.upload_dir.clone(), config.upload_max_bytes);
    uploads
        .ensure_dir()
        .await
        .context("failed to create upload directory")?;

    let credentials = Arc::new(PgCredentialStore::new(db.clone()));
    let gate = build_auth_gate(config, build_token_codec(config), credentials);

    Ok(AppState {
        db,
        id_codec,
        gate,
        passwords: PasswordHasher::new(config.bcrypt_cost),
        uploads,
        public_base_url: config.public_base_url.as_deref().map(Arc::from),
    })
}

/// The full application router, layers included. Public so tests can drive it with `oneshot`.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let uploads = ServeDir::new(state.uploads.dir());

    let api = middleware::rate_limit::apply(
        api::v1::routes(&state),
        middleware::rate_limit::RateLimiter::from_config(config),
    );

    let router = Router::new()
        .nest("/api/v1", api)
        .nest_service("/uploads", uploads)
        .fallback(api::v1::handlers::health::not_found)
        .with_state(state);

    let router = middleware::security_headers::apply(router, config.app_env.is_production());
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}
