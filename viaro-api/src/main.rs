use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use viaro_api::{
    app,
    state::{AppState, AuthConfig},
    worker,
};
use viaro_booking::BookingWorkflow;
use viaro_core::repository::UserRepository;
use viaro_inventory::{InventoryManager, TripStore};
use viaro_store::{
    app_config::Config, DbClient, EventProducer, FleetRepository, PostgresBookingStore,
    PostgresTripStore, PostgresUserRepository, RedisClient, SupportRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viaro_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Viaro API on port {}", config.server.port);

    let db = Arc::new(DbClient::new(&config.database.url).await?);
    db.migrate().await?;
    let business_rules = db.fetch_business_rules(config.business_rules.clone()).await?;

    let redis = Arc::new(RedisClient::new(&config.redis.url).await?);
    let kafka = Arc::new(EventProducer::new(&config.kafka.brokers)?);

    let fleet = Arc::new(FleetRepository::new(db.pool.clone()));
    let trips = Arc::new(PostgresTripStore::new(db.pool.clone()));
    let trip_store: Arc<dyn TripStore> = trips.clone();
    let inventory = Arc::new(
        InventoryManager::new(trip_store, fleet.clone(), fleet.clone())
            .with_max_retries(business_rules.reservation_max_retries),
    );
    let bookings = Arc::new(PostgresBookingStore::new(db.pool.clone()));
    let workflow = Arc::new(
        BookingWorkflow::new(inventory.clone(), bookings)
            .with_booking_fee(business_rules.booking_fee_amount),
    );
    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(db.pool.clone()));
    let support = Arc::new(SupportRepository::new(db.pool.clone()));

    let (sse_tx, _) = broadcast::channel(100);

    tokio::spawn(worker::start_availability_worker(
        config.kafka.brokers.clone(),
        config.kafka.consumer_group.clone(),
        redis.clone(),
    ));
    tokio::spawn(worker::start_trip_materializer(
        fleet.clone(),
        inventory.clone(),
        business_rules.materialize_days_ahead,
        business_rules.materializer_interval_seconds,
    ));

    let app_state = AppState {
        db,
        redis,
        kafka,
        inventory,
        workflow,
        trips,
        fleet,
        users,
        support,
        sse_tx,
        business_rules,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
