//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod health;

use axum::{Router, routing::get};
use platform::config::DatabaseConfig;
use platform::transaction::{PgStorage, UnitOfWorkRegistry, UnitOfWorkRegistryBuilder};
use sqlx::PgPool;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallets::PgWalletRepository;

use crate::health::{AppState, health};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,platform=info,wallets=info,customers=info,payments=info,users=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let config = DatabaseConfig::from_env()?;
    let pool = config.connect().await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Connected to database"
    );

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let registry = register_modules(&pool)?;

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .with_state(AppState::new(pool, registry))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31113));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Register every module's unit of work and freeze the registry.
///
/// Module handlers are built against the frozen registry here as well, so a
/// module that forgot to register fails startup instead of its first request.
fn register_modules(pool: &PgPool) -> anyhow::Result<UnitOfWorkRegistry<PgStorage>> {
    let mut builder = UnitOfWorkRegistryBuilder::new();
    customers::register_unit_of_work(&mut builder, pool.clone())?;
    payments::register_unit_of_work(&mut builder, pool.clone())?;
    users::register_unit_of_work(&mut builder, pool.clone())?;
    wallets::register_unit_of_work(&mut builder, pool.clone())?;
    let registry = builder.freeze();

    wallets::bootstrap(&registry, PgWalletRepository::new())?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_register_modules() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/inflow")
            .unwrap();

        let registry = register_modules(&pool).unwrap();

        assert_eq!(
            registry.modules(),
            vec![customers::MODULE, payments::MODULE, users::MODULE, wallets::MODULE]
        );
        for module in registry.modules() {
            assert_eq!(registry.resolve(module).unwrap()().module(), module);
        }
        assert_eq!(
            registry.resolve(wallets::MODULE).unwrap()().storage().schema(),
            wallets::SCHEMA
        );
    }
}
