use anyhow::Context;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use guest_seating::{
    config::Config, database::Database, repository::PgSeatingRepository, AppState,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    let filter = EnvFilter::new(&config.app.rust_log);
    if config.app.json_logs || config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Guest Seating API ({})", config.app.environment);

    // Connect to the database
    let db = Database::from_config(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    let repo = Arc::new(PgSeatingRepository::new(db));
    let app_state = AppState::new(repo, config.seating);
    info!(
        "Seating policy: require_confirmed={}",
        config.seating.require_confirmed
    );

    let host: std::net::IpAddr = config
        .app
        .host
        .parse()
        .with_context(|| format!("Invalid APP__HOST: {}", config.app.host))?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, guest_seating::app(app_state).into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
