use schoolhub_db::AppState;
use schoolhub_migration::{Migrator, MigratorTrait};
use schoolhub_server::config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env().expect("invalid server configuration");

    // Database connection
    let db_config = schoolhub_db::DatabaseConfig::from_env();
    tracing::info!("connecting to database...");
    let db = schoolhub_db::connect(&db_config)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("running database migrations...");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    tracing::info!("migrations complete");

    let state = Arc::new(AppState {
        db,
        jwt_secret: config.jwt_secret.clone(),
        audit_page_size: config.audit_page_size,
        trusted_proxies: config.trusted_proxies.clone(),
    });

    let app = schoolhub_server::router(state).layer(schoolhub_server::cors_layer(&config.cors_origins));

    tracing::info!(addr = %config.bind, production = config.production, "server started");

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("failed to bind listen address");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
