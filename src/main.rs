use library_loans::{
    adapters::{
        memory::MemoryStore,
        postgres::{PostgresActiveLoansView, PostgresCatalogStore, PostgresLoanLedger},
    },
    api::{handlers::AppState, router::create_router},
    application::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_loans=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let service_deps = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!(
                max_connections = config.max_connections,
                "Connected to PostgreSQL and applied migrations"
            );

            ServiceDependencies {
                catalog_store: Arc::new(PostgresCatalogStore::new(pool.clone())),
                loan_ledger: Arc::new(PostgresLoanLedger::new(pool.clone())),
                active_loans_view: Arc::new(PostgresActiveLoansView::new(pool)),
            }
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store");
            let store = Arc::new(MemoryStore::new());

            ServiceDependencies {
                catalog_store: store.clone(),
                loan_ledger: store.clone(),
                active_loans_view: store,
            }
        }
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
