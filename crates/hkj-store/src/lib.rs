//! Best-effort room snapshot storage over redis.
//!
//! The store is an opaque put/get/delete with TTL; every operation is
//! independent and a failure never aborts the mutation that triggered it —
//! callers log and continue. Keys are namespaced `hanamikoji:room:<code>`.
use hkj_core::RoomCode;
use redis::AsyncCommands;

/// Namespaced storage key for one room.
pub fn room_key(code: &RoomCode) -> String {
    format!("hanamikoji:room:{}", code)
}

/// Handle to the snapshot keyspace. Cheap to clone; connections are
/// multiplexed per operation.
#[derive(Clone)]
pub struct SnapshotStore {
    client: redis::Client,
    ttl: u64,
}

impl SnapshotStore {
    /// Builds a store from `REDIS_URL`, or `None` when the variable is
    /// unset and snapshotting is disabled.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("REDIS_URL").ok()?;
        let ttl = std::env::var("ROOM_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(hkj_core::ROOM_TTL_SECONDS);
        match redis::Client::open(url) {
            Ok(client) => Some(Self { client, ttl }),
            Err(e) => {
                log::warn!("[store] bad REDIS_URL, snapshots disabled: {}", e);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, value: String) -> redis::RedisResult<()> {
        self.client
            .get_multiplexed_async_connection()
            .await?
            .set_ex::<_, _, ()>(key, value, self.ttl)
            .await
    }
    pub async fn get(&self, key: &str) -> redis::RedisResult<Option<String>> {
        self.client
            .get_multiplexed_async_connection()
            .await?
            .get(key)
            .await
    }
    pub async fn delete(&self, key: &str) -> redis::RedisResult<()> {
        self.client
            .get_multiplexed_async_connection()
            .await?
            .del::<_, ()>(key)
            .await
    }
}
