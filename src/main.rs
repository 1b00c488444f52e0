//! Aqua RFQ quote issuance server entrypoint.
//!
//! Boots the full HTTP surface described in `SPEC_FULL.md` §6: the core quoting endpoints
//! under `/v1`, and the admin CRUD surface. Binds to `HOST`/`PORT`, installs tracing and
//! (when `OTEL_*` is set) OpenTelemetry export, connects to Postgres and runs migrations, and
//! shuts down gracefully on SIGTERM/SIGINT.

mod admin;
mod amounts;
mod calldata;
mod canonical;
mod chain;
mod config;
mod db;
mod errors;
mod handlers;
mod orchestrator;
mod pricing_client;
mod request_id;
mod rpc;
mod sig_down;
mod signer;
mod strategy_client;
mod telemetry;
mod timestamp;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::middleware;
use dotenvy::dotenv;
use tower_http::cors;
use tower_http::timeout::TimeoutLayer;

use crate::chain::ChainsRegistry;
use crate::config::Config;
use crate::handlers::AppState;
use crate::orchestrator::Orchestrator;
use crate::request_id::RequestIdLayer;
use crate::rpc::ProviderCache;
use crate::sig_down::SigDown;
use crate::signer::SignerCache;
use crate::telemetry::Telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _telemetry = Telemetry::init(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::load().unwrap_or_else(|e| {
        tracing::error!("configuration error: {e}");
        std::process::exit(1);
    });

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let chains = ChainsRegistry::new(&config);
    let pricing = pricing_client::PricingClient::new(
        config.pricing_url.as_str(),
        Duration::from_millis(config.request_timeout_ms),
    )?;
    let strategy = strategy_client::StrategyClient::new(
        config.strategy_url.as_str(),
        Duration::from_millis(config.request_timeout_ms),
    )?;

    let orchestrator = Arc::new(Orchestrator {
        pool,
        chains,
        providers: ProviderCache::new(),
        signers: SignerCache::new(),
        pricing,
        strategy,
        quote_expiry_seconds: config.quote_expiry_seconds,
    });

    let state = AppState { orchestrator };

    let app = Router::new()
        .merge(handlers::routes())
        .merge(admin::routes())
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_millis(
            config.global_timeout_ms,
        )))
        .layer(middleware::from_fn(errors::timeout_fallback))
        .layer(Telemetry::http_tracing())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT])
                .allow_headers(cors::Any),
        )
        .layer(RequestIdLayer);

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!("starting aqua-rfq at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        tracing::error!("failed to bind to {addr}: {e}");
        std::process::exit(1);
    });

    let sig_down = SigDown::try_new()?;
    let cancellation_token = sig_down.cancellation_token();
    let graceful_shutdown = async move { cancellation_token.cancelled().await };

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
