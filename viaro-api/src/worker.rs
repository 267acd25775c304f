use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use viaro_inventory::{InventoryError, InventoryManager};
use viaro_shared::models::events::{BookingCancelledEvent, BookingConfirmedEvent};
use viaro_store::events::{TOPIC_BOOKING_CANCELLED, TOPIC_BOOKING_CONFIRMED};
use viaro_store::{FleetRepository, RedisClient};

/// Keeps the cached availability counters roughly in line with booking
/// traffic. The trips table stays authoritative; a stale or missing
/// counter only costs a reseed on the next search.
pub async fn start_availability_worker(brokers: String, group_id: String, redis: Arc<RedisClient>) {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()
        .expect("Consumer creation failed");

    consumer
        .subscribe(&[TOPIC_BOOKING_CONFIRMED, TOPIC_BOOKING_CANCELLED])
        .expect("Can't subscribe to booking topics");

    info!("Availability worker started, listening to booking events");

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                let topic = m.topic().to_string();
                let payload = match m.payload_view::<str>() {
                    Some(Ok(p)) => p.to_string(),
                    Some(Err(e)) => {
                        error!("Error reading payload: {}", e);
                        continue;
                    }
                    None => continue,
                };
                handle_booking_event(&redis, &topic, &payload).await;
            }
        }
    }
}

async fn handle_booking_event(redis: &RedisClient, topic: &str, payload: &str) {
    if topic == TOPIC_BOOKING_CONFIRMED {
        let event: BookingConfirmedEvent = match serde_json::from_str(payload) {
            Ok(e) => e,
            Err(e) => {
                error!("Malformed booking.confirmed payload: {}", e);
                return;
            }
        };
        // The event carries its seat ids, so no store lookup is needed.
        match redis
            .decr_trip_availability(&event.trip_id.to_string(), event.seat_ids.len() as i64)
            .await
        {
            Ok(Some(new_val)) => {
                info!(trip_id = %event.trip_id, available = new_val, "Decremented cached availability");
            }
            Ok(None) => {
                debug!(trip_id = %event.trip_id, "Cache miss, counter will be seeded on next search");
            }
            Err(e) => error!("Failed to decrement availability cache: {}", e),
        }
    } else {
        let event: BookingCancelledEvent = match serde_json::from_str(payload) {
            Ok(e) => e,
            Err(e) => {
                error!("Malformed booking.cancelled payload: {}", e);
                return;
            }
        };
        // Dropping the counter is simpler than incrementing it back and
        // risking drift; the next search reseeds from the store.
        if let Err(e) = redis.del_trip_availability(&event.trip_id.to_string()).await {
            error!("Failed to invalidate availability cache: {}", e);
        }
    }
}

/// Periodic sweep that materializes trips for every active schedule over
/// the configured horizon. Materialization is idempotent per
/// (schedule, date), so overlapping sweeps are harmless.
pub async fn start_trip_materializer(
    fleet: Arc<FleetRepository>,
    inventory: Arc<InventoryManager>,
    days_ahead: u32,
    interval_seconds: u64,
) {
    info!(days_ahead, interval_seconds, "Trip materializer started");

    loop {
        match fleet.list_active_schedules().await {
            Err(e) => error!("Failed to list schedules for materialization: {}", e),
            Ok(schedules) => {
                let today = Utc::now().date_naive();
                for schedule in &schedules {
                    for offset in 0..days_ahead as i64 {
                        let date = today + ChronoDuration::days(offset);
                        if !schedule.operates_on(date) {
                            continue;
                        }
                        match inventory.materialize(schedule.id, date).await {
                            Ok(_) => {}
                            // A schedule suspended mid-sweep just stops producing trips.
                            Err(InventoryError::ScheduleInactive { .. }) => break,
                            Err(e) => {
                                warn!(schedule_id = %schedule.id, %date, "Materialization failed: {}", e);
                            }
                        }
                    }
                }
            }
        }

        sleep(Duration::from_secs(interval_seconds)).await;
    }
}
