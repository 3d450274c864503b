mod allowance;
mod cache;
mod config;
mod error;
mod openapi;
mod poller;
mod routes;
mod social;
mod stats;

use axum::{error_handling::HandleErrorLayer, http::StatusCode, BoxError};
use reqwest::Client;
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::{create_profile_cache, start_cache_cleanup_task};
use crate::config::AppConfig;
use crate::poller::{PollScheduler, StatsBoard, StatsPoller};
use crate::social::{HttpSocialClient, SocialClient};
use crate::stats::StatsService;

/// Shared HTTP client configuration
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

#[derive(Clone)]
pub struct AppState {
    pub stats_service: Arc<StatsService>,
    pub board: Arc<StatsBoard>,
    pub poller: StatsPoller,
}

/// Build the one HTTP client shared by every social API call
fn create_http_client(timeout_secs: u64) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .pool_max_idle_per_host(10)
        .build()
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal error: {}", err),
        )
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl+c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "markstats=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        marker = %config.stats.marker,
        daily_allowance = config.stats.daily_allowance,
        reset_hour_utc = config.stats.reset_hour_utc,
        max_posts = config.stats.max_posts,
        "Configuration loaded successfully"
    );

    // One long-lived client handle for the social API
    let http_client = create_http_client(config.social.timeout_secs)?;
    let social_client: Arc<dyn SocialClient> = Arc::new(HttpSocialClient::new(
        http_client,
        &config.social.base_url,
        &config.social.api_key,
    ));
    tracing::debug!(base_url = %config.social.base_url, "Social API client created");

    let profile_cache = create_profile_cache(Duration::from_secs(config.profile_cache_ttl_secs));
    start_cache_cleanup_task(Arc::clone(&profile_cache));

    let stats_service = Arc::new(StatsService::new(
        social_client,
        profile_cache,
        &config.stats,
    ));
    let board = Arc::new(StatsBoard::new());
    let poller = StatsPoller::new(Arc::clone(&stats_service), Arc::clone(&board));

    let mut scheduler = PollScheduler::new().await?;
    if config.poller.enabled {
        let users = scheduler
            .schedule_polling(poller.clone(), &config.poller)
            .await?;
        scheduler.start().await?;
        tracing::info!(users = users, "Poll scheduler started");
    } else {
        tracing::info!("Polling disabled; stats are computed on demand only");
    }

    let state = AppState {
        stats_service,
        board,
        poller,
    };

    let app = routes::build_router()
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                // Must outlast the social client timeout
                .timeout(Duration::from_secs(config.social.timeout_secs + 30)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if config.poller.enabled {
        scheduler.shutdown().await?;
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
