use std::sync::Arc;

use tokio::sync::broadcast;
use viaro_booking::BookingWorkflow;
use viaro_core::repository::UserRepository;
use viaro_inventory::InventoryManager;
use viaro_shared::models::events::TripSeatEvent;
use viaro_store::app_config::BusinessRules;
use viaro_store::{
    DbClient, EventProducer, FleetRepository, PostgresTripStore, RedisClient, SupportRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub redis: Arc<RedisClient>,
    pub kafka: Arc<EventProducer>,
    pub inventory: Arc<InventoryManager>,
    pub workflow: Arc<BookingWorkflow>,
    pub trips: Arc<PostgresTripStore>,
    pub fleet: Arc<FleetRepository>,
    pub users: Arc<dyn UserRepository>,
    pub support: Arc<SupportRepository>,
    pub sse_tx: broadcast::Sender<TripSeatEvent>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
