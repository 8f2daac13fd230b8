use std::sync::Arc;
use std::net::SocketAddr;
use tempora_api::{app, state::{AppState, AuthConfig}};
use tempora_bookings::BookingLister;
use tempora_core::repository::BookingRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempora_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tempora_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Tempora API on port {}", config.server.port);

    // Database Connection
    let db = tempora_store::DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis Connection
    let redis_client = tempora_store::RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis_arc = Arc::new(redis_client);

    let repo: Arc<dyn BookingRepository> = Arc::new(tempora_store::PgBookingRepository::new(db.pool.clone()));
    let lister = Arc::new(BookingLister::new(repo));

    let app_state = AppState {
        lister,
        redis: redis_arc.clone(),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await.unwrap();
}
