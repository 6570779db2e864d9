use anyhow::Context;
use tracing_subscriber::EnvFilter;

use phoenix::config::Config;
use phoenix::db::{connect_to_db, run_migrations};
use phoenix::routes::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("phoenix=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = connect_to_db(&config).await?;
    run_migrations(&pool).await?;

    let addr = config.bind_address;
    tracing::info!("Listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(router(pool, config).into_make_service())
        .await
        .context("Server error")
}
