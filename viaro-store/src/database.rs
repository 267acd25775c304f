use crate::app_config::BusinessRules;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay operator-tuned business rules from the database onto the
    /// file-based defaults. Row format: rule_value = {"value": <number>}.
    pub async fn fetch_business_rules(
        &self,
        defaults: BusinessRules,
    ) -> Result<BusinessRules, sqlx::Error> {
        let rows = sqlx::query("SELECT rule_key, rule_value FROM business_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;

        for row in rows {
            let key: String = row.try_get("rule_key")?;
            let val: serde_json::Value = row.try_get("rule_value")?;

            if let Some(v) = val.get("value") {
                match key.as_str() {
                    "reservation_max_retries" => {
                        if let Some(u) = v.as_u64() {
                            rules.reservation_max_retries = u as u32;
                        }
                    }
                    "materialize_days_ahead" => {
                        if let Some(u) = v.as_u64() {
                            rules.materialize_days_ahead = u as u32;
                        }
                    }
                    "materializer_interval_seconds" => {
                        if let Some(u) = v.as_u64() {
                            rules.materializer_interval_seconds = u;
                        }
                    }
                    "booking_fee_amount" => {
                        if let Some(n) = v.as_i64() {
                            rules.booking_fee_amount = n as i32;
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(rules)
    }
}
