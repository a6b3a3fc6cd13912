use contact_quality_api::config::Config;
use contact_quality_api::handlers::{analysis_routes, assemble_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, creates the summary store and
/// starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contact_quality_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let app_state = Arc::new(AppState::new(config.clone()));
    tracing::info!("Summary store initialized (empty)");

    // Per-IP rate limit on the analysis and export routes
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
    );

    // Health check bypasses rate limiting
    let limited_routes = analysis_routes().layer(GovernorLayer {
        config: governor_conf,
    });
    let app = assemble_router(app_state, limited_routes);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
