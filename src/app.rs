/*
 * Responsibility
 * - Config読み込み → 依存生成 (route table, session verifier, identity provider, view cache)
 * - Router 組み立て (access filter → security headers → CORS → HTTP layers)
 * - axum::serve() で起動
 */
use anyhow::{Context, Result};
use axum::Router;
use std::{panic, process, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::access::{AccessPolicy, RouteTable};
use crate::services::cache::{
    CachedViews, MemoryCacheClient, ValkeyClient, ViewCache, ttl_seconds,
};
use crate::services::identity::{HostedIdentityProvider, IdentityProvider, SessionVerifier};
use crate::state::AppState;

/// Key prefix for rendered views in the shared cache backend.
const VIEW_CACHE_PREFIX: &str = "role-gate:views";

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,role_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting role gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_app(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build process-level services and inject them into the shared application state.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let routes = RouteTable::from_patterns(
        config.admin_routes.as_slice(),
        config.public_routes.as_slice(),
    )
    .context("invalid route pattern")?;
    for (pattern, class) in routes.patterns() {
        tracing::debug!(pattern, ?class, "route rule");
    }
    let access = AccessPolicy::new(routes, config.sign_in_url.clone());

    let verifier = SessionVerifier::new(
        &config.session_key,
        config.session_issuer.as_deref(),
        config.session_audience.as_deref(),
        config.session_leeway_seconds,
    )
    .context("invalid session verification key")?;
    let identity: Arc<dyn IdentityProvider> = Arc::new(HostedIdentityProvider::new(
        verifier,
        &config.idp_api_url,
        config.idp_secret_key.clone(),
    )?);

    let views = build_views(config).await?;

    Ok(AppState::new(
        access,
        identity,
        views,
        &config.session_cookie_name,
    ))
}

async fn build_views(config: &Config) -> Result<Arc<dyn ViewCache>> {
    let ttl = ttl_seconds(config.view_cache_ttl_seconds);

    let views: Arc<dyn ViewCache> = match config.valkey_url.as_deref() {
        Some(url) => {
            let client = ValkeyClient::new(url)
                .await
                .context("failed to connect to valkey")?;
            tracing::info!("view cache backend: valkey");
            Arc::new(CachedViews::new_with_cache(
                Arc::new(client),
                VIEW_CACHE_PREFIX,
                ttl,
            ))
        }
        None => {
            tracing::info!("VALKEY_URL not set; view cache backend: memory");
            Arc::new(CachedViews::new_with_cache(
                Arc::new(MemoryCacheClient::new()),
                VIEW_CACHE_PREFIX,
                ttl,
            ))
        }
    };

    Ok(views)
}

/// Routes + access filter, with state applied.
pub fn build_router(state: AppState) -> Router {
    let router = middleware::access::apply(api::routes(), state.clone());
    router.with_state(state)
}

/// The full service: routes, access filter and every cross-cutting layer.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let router = build_router(state);
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config.request_timeout)
}
