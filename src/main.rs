use arcade::players::{InMemoryPlayerRepository, PostgresPlayerRepository};
use arcade::rewards::{
    LedgerSink, PlayerContextProvider, RewardApplier, RewardCalculator,
    TracingAchievementEvaluator,
};
use arcade::session::{InMemorySessionRepository, PostgresSessionRepository, SessionRepository};
use arcade::{build_router, AppConfig, AppState, SessionRegistry};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arcade=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    info!(bind_address = %config.bind_address, "Starting arcade server");

    let (sessions, context, ledger) = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .expect("Failed to connect to database");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            info!("Connected to PostgreSQL");

            let sessions: Arc<dyn SessionRepository> =
                Arc::new(PostgresSessionRepository::new(pool.clone()));
            let players = Arc::new(PostgresPlayerRepository::new(pool));
            let context: Arc<dyn PlayerContextProvider> = players.clone();
            let ledger: Arc<dyn LedgerSink> = players;
            (sessions, context, ledger)
        }
        None => {
            warn!("DATABASE_URL not set, sessions and balances are kept in memory");
            let sessions: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
            let players = Arc::new(InMemoryPlayerRepository::new());
            let context: Arc<dyn PlayerContextProvider> = players.clone();
            let ledger: Arc<dyn LedgerSink> = players;
            (sessions, context, ledger)
        }
    };

    let rewards = RewardApplier::new(
        RewardCalculator::new(config.rewards.clone()),
        context,
        ledger,
        Arc::new(TracingAchievementEvaluator),
    );
    let registry = Arc::new(SessionRegistry::new(sessions, rewards, config.sweep));
    registry.start().await;

    let app = build_router(AppState::new(registry.clone()));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("Failed to bind address");
    info!("Server running on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    registry.shutdown().await;
    info!(live_sessions = registry.active_count().await, "Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
