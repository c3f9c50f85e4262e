/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (認証 filter, upstream client) → Router 組み立て
 * - Middleware の適用 (auth → http → CORS の順で外側へ。CORS は allowlist 設定時のみ)
 * - axum::serve() で起動
 */
use std::{panic, process};

use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::{auth::build_authentication_filter, upstream::UpstreamClient};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,gateway_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env().inspect_err(|err| {
        tracing::error!(error = %err, "failed to load configuration");
    })?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {} (upstream {})",
        config.app_env,
        config.addr,
        config.upstream_base_url
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, addr = %config.addr, "failed to bind");
            AppError::Internal
        })?;
    axum::serve(listener, app).await.map_err(|err| {
        tracing::error!(error = %err, "server error");
        AppError::Internal
    })?;

    Ok(())
}

fn build_state(config: &Config) -> Result<AppState, AppError> {
    // Process-level services: built once, shared read-only by every request.
    let auth = build_authentication_filter(config);

    let upstream = UpstreamClient::new(config.upstream_base_url.clone()).map_err(|err| {
        tracing::error!(error = %err, "failed to build upstream client");
        AppError::Internal
    })?;

    tracing::debug!(
        excluded_paths = ?config.excluded_paths,
        rules = config.access_policy.rules().len(),
        upstream = %upstream.base_url(),
        "authentication filter ready"
    );

    Ok(AppState::new(auth, upstream))
}

fn build_router(state: AppState, config: &Config) -> Router {
    // Everything except /health goes through the filter and on to the upstream.
    let gateway = middleware::auth::access::apply(
        Router::new().fallback(api::handlers::forward),
        state.clone(),
    )
    .with_state(state);

    let router = Router::new()
        .route("/health", get(api::handlers::health))
        .fallback_service(gateway);

    let router = middleware::http::apply(router, config);
    middleware::cors::apply(router, config)
}
