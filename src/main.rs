use anyhow::Result;
use lab_portal::api::{AppState, create_router};
use lab_portal::config::Config;
use lab_portal::database::{self, seed::seed_defaults};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lab_portal=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let pool = database::create_connection(&config.database_url, config.max_connections).await?;
    tracing::info!("Connected to {}", config.database_url);

    if config.seed_defaults && seed_defaults(&pool, &config).await? {
        tracing::info!("Seeded default accounts and facilities");
    }

    let address = config.server_address();
    let app = create_router(AppState::new(pool, config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Portal listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(why) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown: {:?}", why);
    }
    tracing::info!("Shutting down");
}
