use hkj_cards::GeishaSet;
use hkj_core::*;
use hkj_gameroom::*;
use hkj_players::Difficulty;
use hkj_store::room_key;
use hkj_store::SnapshotStore;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a six-character uppercase alphanumeric room code.
fn generate_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// The house: a process-wide registry of running rooms. Routes joiners to
/// their room, rehydrates rooms from snapshots on a miss, and sweeps rooms
/// whose humans are all gone.
pub struct Okiya {
    rooms: RwLock<HashMap<RoomCode, RoomHandle>>,
    store: Option<SnapshotStore>,
    timing: RoomTiming,
}

impl Okiya {
    pub fn new(store: Option<SnapshotStore>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            store,
            timing: RoomTiming::default(),
        }
    }

    /// Opens a fresh room for its creator and becomes its home until the
    /// room task exits.
    pub async fn create(
        self: &Arc<Self>,
        player: PlayerId,
        name: String,
        conn: ConnectionTx,
        mode: RoomMode,
        difficulty: Option<Difficulty>,
        set: GeishaSet,
    ) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        let code = loop {
            let code = generate_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };
        let (handle, done) = Room::create(
            code.clone(),
            player,
            name,
            conn,
            mode,
            difficulty,
            set,
            self.store.clone(),
            self.timing,
        );
        rooms.insert(code.clone(), handle.clone());
        drop(rooms);
        self.adopt(code.clone(), done);
        log::info!("[okiya] created room {}", code);
        handle
    }

    /// Finds a room by code: in memory first, then the snapshot store. The
    /// write lock is held across the miss path so concurrent joins cannot
    /// rehydrate the same room twice.
    pub async fn join(self: &Arc<Self>, code: &RoomCode) -> anyhow::Result<RoomHandle> {
        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(code) {
            return Ok(handle.clone());
        }
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("room not found"))?;
        let json = store
            .get(&room_key(code))
            .await
            .map_err(|e| anyhow::anyhow!("snapshot lookup failed: {}", e))?
            .ok_or_else(|| anyhow::anyhow!("room not found"))?;
        let snapshot = RoomSnapshot::from_json(&json)
            .map_err(|e| anyhow::anyhow!("snapshot decode failed: {}", e))?;
        let (handle, done) = Room::rehydrate(snapshot, self.store.clone(), self.timing);
        rooms.insert(code.clone(), handle.clone());
        drop(rooms);
        self.adopt(code.clone(), done);
        Ok(handle)
    }

    /// Watches a room's completion signal; on exit, drops it from the
    /// registry and deletes its snapshot.
    fn adopt(self: &Arc<Self>, code: RoomCode, done: tokio::sync::oneshot::Receiver<()>) {
        let okiya = self.clone();
        tokio::spawn(async move {
            let _ = done.await;
            okiya.rooms.write().await.remove(&code);
            if let Some(store) = &okiya.store {
                if let Err(e) = store.delete(&room_key(&code)).await {
                    log::warn!("[okiya] snapshot delete for {} failed: {}", code, e);
                }
            }
            log::info!("[okiya] room {} cleaned up", code);
        });
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_uppercase_alphanumerics() {
        for _ in 0..64 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn create_then_join_yields_the_same_room() {
        let okiya = Arc::new(Okiya::new(None));
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = okiya
            .create(
                "host".into(),
                "Host".into(),
                tx,
                RoomMode::Online,
                None,
                GeishaSet::Default,
            )
            .await;
        let joined = okiya.join(&handle.code).await.unwrap();
        assert_eq!(joined.code, handle.code);
    }

    #[tokio::test]
    async fn join_of_unknown_room_fails_without_a_store() {
        let okiya = Arc::new(Okiya::new(None));
        assert!(okiya.join(&"NOROOM".to_string()).await.is_err());
    }
}
