//! Patient portal REST server.
//!
//! # Environment Variables
//! - `PACIENTES_ADDR`: listen address (default `0.0.0.0:8000`, or `0.0.0.0:$PORT`)
//! - `PACIENTES_DB_PATH`: SQLite file (default `pacientes.db`, `:memory:` for a scratch store)
//! - `APP_ENV`: deployment environment (default `development`)
//! - `RUST_LOG`: extra tracing directives

use pacientes_server::{router, AppState, ServerConfig, BASE_PATH};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pacientes_server=info".parse()?)
                .add_directive("pacientes_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let db = config.open_database()?;
    tracing::info!(
        db = %config.db_path,
        environment = %config.environment,
        "database ready"
    );

    let addr = config.addr.clone();
    let app = router(AppState::new(db, config));

    tracing::info!("-- Starting patient portal API on {}{}", addr, BASE_PATH);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
