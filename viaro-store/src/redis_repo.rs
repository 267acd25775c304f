use redis::AsyncCommands;
use redis::RedisResult;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Sliding-window-ish rate limit: INCR the caller's key and bound it.
    /// First hit sets the window expiry.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: u32,
        window_seconds: u64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_async_connection().await?;
        let count: u32 = conn.incr(key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(key, window_seconds as i64).await?;
        }
        Ok(count <= limit)
    }

    // Availability cache: read by trip search (seeded on a miss), decremented
    // by the availability worker when bookings confirm. The store row stays
    // authoritative; this only serves listing pages.

    pub async fn get_trip_availability(&self, trip_id: &str) -> RedisResult<Option<i32>> {
        let mut conn = self.client.get_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        conn.get(key).await
    }

    pub async fn set_trip_availability(&self, trip_id: &str, count: i32) -> RedisResult<()> {
        let mut conn = self.client.get_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        conn.set(key, count).await
    }

    /// Atomic decrement; returns None on a cache miss so callers skip
    /// instead of seeding a bogus negative counter.
    pub async fn decr_trip_availability(&self, trip_id: &str, by: i64) -> RedisResult<Option<i64>> {
        let mut conn = self.client.get_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        let exists: bool = conn.exists(&key).await?;
        if !exists {
            return Ok(None);
        }
        let new_val: i64 = conn.decr(&key, by).await?;
        Ok(Some(new_val))
    }

    pub async fn del_trip_availability(&self, trip_id: &str) -> RedisResult<()> {
        let mut conn = self.client.get_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        conn.del(key).await
    }
}
