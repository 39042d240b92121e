//! Saved games, one slot per session id.
//!
//! A slot is rewritten after every answered question, so `upsert` replaces by
//! id and repeated saves of the same state leave exactly one slot behind.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{KeyValueStore, Loaded, SAVES_KEY, read_collection, write_collection};
use crate::game::GameSession;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlot {
    pub id: String,
    pub name: String,
    /// Epoch milliseconds.
    pub saved_at: i64,
    pub state: GameSession,
}

impl SaveSlot {
    pub fn for_session(session: &GameSession, saved_at: i64) -> Self {
        Self {
            id: session.id.clone(),
            name: slot_name(session),
            saved_at,
            state: session.clone(),
        }
    }

    /// Local time of the save, `dd.mm.yyyy hh:mm`.
    pub fn saved_at_display(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.saved_at)
            .map(|t| t.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// `"<pack title> · <player>, <player>"`
pub fn slot_name(session: &GameSession) -> String {
    let players: Vec<&str> = session.players.iter().map(|p| p.name.as_str()).collect();
    format!("{} · {}", session.pack.title, players.join(", "))
}

pub struct SaveStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SaveStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> Loaded<SaveSlot> {
        read_collection(self.kv.as_ref(), SAVES_KEY)
    }

    /// All slots in insertion order.
    pub fn list(&self) -> Vec<SaveSlot> {
        self.load().into_vec()
    }

    /// All slots, most recently saved first.
    pub fn newest_first(&self) -> Vec<SaveSlot> {
        let mut slots = self.list();
        slots.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        slots
    }

    pub fn find(&self, id: &str) -> Option<SaveSlot> {
        self.list().into_iter().find(|s| s.id == id)
    }

    pub fn upsert(&self, slot: SaveSlot) {
        let mut slots = self.list();
        match slots.iter_mut().find(|s| s.id == slot.id) {
            Some(existing) => *existing = slot,
            None => slots.push(slot),
        }
        self.write(&slots);
    }

    /// Saves `session` under its own id, stamped with the current time.
    pub fn save_game(&self, session: &GameSession) {
        let slot = SaveSlot::for_session(session, Utc::now().timestamp_millis());
        debug!(id = %slot.id, answered = session.answered().len(), "saving game");
        self.upsert(slot);
    }

    pub fn delete(&self, id: &str) {
        let mut slots = self.list();
        let before = slots.len();
        slots.retain(|s| s.id != id);
        if slots.len() != before {
            self.write(&slots);
        }
    }

    fn write(&self, slots: &[SaveSlot]) {
        if let Err(e) = write_collection(self.kv.as_ref(), SAVES_KEY, slots) {
            warn!(error = %e, "could not write saved games");
        }
    }
}

/// Serde adapter storing the answered set as sorted `"c-q"` strings.
pub(crate) mod answered_keys {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    use crate::model::Cell;

    pub fn serialize<S: Serializer>(cells: &BTreeSet<Cell>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(cells.iter().map(Cell::to_string))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<Cell>, D::Error> {
        let keys = Vec::<String>::deserialize(deserializer)?;
        Ok(keys
            .iter()
            .filter_map(|key| match key.parse::<Cell>() {
                Ok(cell) => Some(cell),
                Err(e) => {
                    warn!(error = %e, "dropping malformed answered key");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;
    use crate::model::tests::sample_pack;
    use crate::storage::MemoryStore;
    use crate::storage::tests::BrokenStore;

    fn session() -> GameSession {
        GameSession::new(sample_pack(), &["Alice".to_string(), "Bob".to_string()], 30).unwrap()
    }

    fn store() -> SaveStore {
        SaveStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_slot_name() {
        assert_eq!(slot_name(&session()), "Chess Night · Alice, Bob");
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = store();
        let slot = SaveSlot::for_session(&session(), 1_000);
        store.upsert(slot.clone());
        store.upsert(slot.clone());

        let slots = store.list();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0], slot);
    }

    #[test]
    fn test_upsert_replaces_matching_id_only() {
        let store = store();
        let first = session();
        let second = session();
        store.upsert(SaveSlot::for_session(&first, 1));
        store.upsert(SaveSlot::for_session(&second, 2));
        store.upsert(SaveSlot::for_session(&first, 3));

        let slots = store.list();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].id, first.id);
        assert_eq!(slots[0].saved_at, 3);
        assert_eq!(slots[1].id, second.id);
    }

    #[test]
    fn test_newest_first() {
        let store = store();
        let (a, b, c) = (session(), session(), session());
        store.upsert(SaveSlot::for_session(&a, 20));
        store.upsert(SaveSlot::for_session(&b, 30));
        store.upsert(SaveSlot::for_session(&c, 10));

        let ids: Vec<String> = store.newest_first().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[test]
    fn test_delete_by_id() {
        let store = store();
        let game = session();
        store.save_game(&game);
        assert!(store.find(&game.id).is_some());

        store.delete("no-such-id");
        assert_eq!(store.list().len(), 1);

        store.delete(&game.id);
        assert!(store.find(&game.id).is_none());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_round_trip_resets_open_question() {
        let store = store();
        let mut game = session();
        game.open(Cell::new(0, 0)).unwrap();
        game.reveal_answer().unwrap();
        game.skip().unwrap();
        game.open(Cell::new(1, 0)).unwrap();
        assert!(game.open_question().is_some());

        store.save_game(&game);
        let loaded = store.find(&game.id).unwrap().state;

        assert_eq!(loaded.answered(), game.answered());
        assert!(loaded.open_question().is_none());
        assert_eq!(loaded.players, game.players);
        assert_eq!(loaded.pack, game.pack);
        assert_eq!(loaded.timer_secs, 30);
    }

    #[test]
    fn test_persisted_shape() {
        let store = SaveStore::new(Arc::new(MemoryStore::new()));
        let mut game = session();
        game.open(Cell::new(1, 0)).unwrap();
        game.toggle_player(0).unwrap();
        game.confirm().unwrap();
        game.open(Cell::new(0, 1)).unwrap();
        game.reveal_answer().unwrap();
        game.skip().unwrap();
        store.upsert(SaveSlot::for_session(&game, 42));

        let raw = store.kv.get(SAVES_KEY).unwrap().unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let slot = &doc[0];
        assert_eq!(slot["savedAt"], 42);
        assert_eq!(slot["state"]["timerSecs"], 30);
        assert_eq!(slot["state"]["answered"], serde_json::json!(["0-1", "1-0"]));
        assert!(slot["state"].get("cur").is_none());
        assert!(slot["state"].get("open").is_none());
    }

    #[test]
    fn test_answered_keys_load_as_set() {
        let raw = serde_json::json!([{
            "id": "g1",
            "name": "x",
            "savedAt": 5,
            "state": {
                "id": "g1",
                "pack": sample_pack(),
                "players": [{"name": "Alice", "score": 100}],
                "timerSecs": 0,
                "answered": ["1-0", "0-0", "1-0", "bogus"]
            }
        }]);
        let kv = Arc::new(MemoryStore::new());
        kv.set(SAVES_KEY, &raw.to_string()).unwrap();
        let store = SaveStore::new(kv);

        let state = store.find("g1").unwrap().state;
        let cells: Vec<Cell> = state.answered().iter().copied().collect();
        assert_eq!(cells, vec![Cell::new(0, 0), Cell::new(1, 0)]);
        assert!(state.open_question().is_none());
    }

    #[test]
    fn test_unavailable_storage_lists_nothing() {
        let store = SaveStore::new(Arc::new(BrokenStore));
        store.save_game(&session());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_saved_at_display_handles_range() {
        let slot = SaveSlot::for_session(&session(), 0);
        assert_ne!(slot.saved_at_display(), "-");
        let bad = SaveSlot::for_session(&session(), i64::MAX);
        assert_eq!(bad.saved_at_display(), "-");
    }
}
