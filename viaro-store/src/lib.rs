pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod fleet_repo;
pub mod redis_repo;
pub mod support_repo;
pub mod trip_repo;
pub mod user_repo;

pub use booking_repo::PostgresBookingStore;
pub use database::DbClient;
pub use events::EventProducer;
pub use fleet_repo::FleetRepository;
pub use redis_repo::RedisClient;
pub use support_repo::SupportRepository;
pub use trip_repo::PostgresTripStore;
pub use user_repo::PostgresUserRepository;
