use chrono::Utc;

use super::backend::KeyValueStore;
use super::state::{RunState, RunStatePatch};
use crate::error::StoreError;

/// Versioned key for the persisted run. Bump the suffix whenever the route or
/// the stop schema changes so stale saves are ignored.
pub const STORAGE_KEY: &str = "museumStampHunt_v2";

/// Persists [`RunState`] snapshots. Failures are logged and reported as
/// `false` or `None`, never propagated.
#[derive(Debug)]
pub struct ProgressStore<B: KeyValueStore> {
    backend: B,
    key: String,
}

impl<B: KeyValueStore> ProgressStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, STORAGE_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        ProgressStore {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn default_state(&self) -> RunState {
        RunState::default()
    }

    /// Writes a copy of `state` stamped with the current save time.
    pub fn save(&mut self, state: &RunState) -> bool {
        match self.try_save(state) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to save progress: {}", e);
                false
            }
        }
    }

    fn try_save(&mut self, state: &RunState) -> Result<(), StoreError> {
        let mut snapshot = state.clone();
        snapshot.saved_at = Some(Utc::now());
        let json = serde_json::to_string(&snapshot)?;
        self.backend.set(&self.key, &json)?;
        tracing::debug!(key = %self.key, bytes = json.len(), "progress saved");
        Ok(())
    }

    /// Whether a snapshot exists under the key, without parsing it. Read
    /// errors count as no saved game.
    pub fn has_saved_game(&self) -> bool {
        matches!(self.backend.get(&self.key), Ok(Some(_)))
    }

    /// Absent and unreadable snapshots both come back as `None`.
    pub fn load(&self) -> Option<RunState> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to read progress: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(key = %self.key, "ignoring corrupt progress: {}", e);
                None
            }
        }
    }

    pub fn clear(&mut self) -> bool {
        match self.backend.remove(&self.key) {
            Ok(()) => {
                tracing::info!(key = %self.key, "progress cleared");
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to clear progress: {}", e);
                false
            }
        }
    }

    /// Loads the current snapshot (or the default), merges `patch` over it and
    /// saves. Last write wins.
    pub fn update(&mut self, patch: RunStatePatch) -> bool {
        let mut state = self.load().unwrap_or_default();
        state.apply(patch);
        self.save(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backend::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn played_state() -> RunState {
        RunState {
            selected_character_id: Some("owl".into()),
            current_room_id: "gallery".into(),
            active_stop_index: 2,
            completed_stop_ids: vec![1, 2],
            hints_used_stop_ids: vec![2],
            points: 35,
            started_at: Some(Utc::now()),
            ..RunState::default()
        }
    }

    #[test]
    fn save_then_load_keeps_everything_but_saved_at() {
        let mut store = ProgressStore::new(MemoryStore::new());
        let state = played_state();
        assert!(store.save(&state));

        let loaded = store.load().unwrap();
        assert!(loaded.saved_at.is_some());
        assert_eq!(
            RunState {
                saved_at: None,
                ..loaded
            },
            state
        );
    }

    #[test]
    fn save_refreshes_saved_at() {
        let mut store = ProgressStore::new(MemoryStore::new());
        let mut state = played_state();
        state.saved_at = Some("2000-01-01T00:00:00Z".parse().unwrap());
        assert!(store.save(&state));
        assert!(store.load().unwrap().saved_at > state.saved_at);
    }

    #[test]
    fn load_without_snapshot_is_none() {
        let store = ProgressStore::new(MemoryStore::new());
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_snapshot_is_treated_as_absent() {
        let mut backend = MemoryStore::new();
        backend.set(STORAGE_KEY, "{not json").unwrap();
        let store = ProgressStore::new(backend);
        assert!(store.load().is_none());
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut backend = MemoryStore::new();
        backend
            .set("museumStampHunt_v1", r#"{"selectedCharacterId":"old"}"#)
            .unwrap();
        let store = ProgressStore::new(backend);
        assert!(store.load().is_none());
    }

    #[test]
    fn rejected_write_returns_false() {
        let mut store = ProgressStore::new(MemoryStore::with_quota(16));
        assert!(!store.save(&played_state()));
        assert!(store.load().is_none());
    }

    #[test]
    fn has_saved_game_tracks_the_snapshot() {
        let mut store = ProgressStore::new(MemoryStore::new());
        assert!(!store.has_saved_game());
        assert!(store.save(&played_state()));
        assert!(store.has_saved_game());
        assert!(store.clear());
        assert!(!store.has_saved_game());
    }

    #[test]
    fn has_saved_game_does_not_parse() {
        let mut backend = MemoryStore::new();
        backend.set(STORAGE_KEY, "{not json").unwrap();
        let store = ProgressStore::new(backend);
        assert!(store.has_saved_game());
        assert!(store.load().is_none());
    }

    #[test]
    fn clear_removes_snapshot() {
        let mut store = ProgressStore::new(MemoryStore::new());
        assert!(store.save(&played_state()));
        assert!(store.clear());
        assert!(store.load().is_none());
    }

    #[test]
    fn update_merges_over_default_when_empty() {
        let mut store = ProgressStore::new(MemoryStore::new());
        assert!(store.update(RunStatePatch {
            selected_character_id: Some(Some("fox".into())),
            ..RunStatePatch::default()
        }));
        let loaded = store.load().unwrap();
        assert_eq!(loaded.selected_character_id.as_deref(), Some("fox"));
        assert_eq!(loaded.active_stop_index, 0);
    }

    #[test]
    fn update_merges_over_saved_state() {
        let mut store = ProgressStore::new(MemoryStore::new());
        store.save(&played_state());
        store.update(RunStatePatch {
            current_room_id: Some("attic".into()),
            ..RunStatePatch::default()
        });
        let loaded = store.load().unwrap();
        assert_eq!(loaded.current_room_id, "attic");
        assert_eq!(loaded.points, 35);
        assert_eq!(loaded.completed_stop_ids, vec![1, 2]);
    }

    #[test]
    fn file_backend_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = ProgressStore::new(FileStore::new(dir.path()));
        let state = played_state();
        assert!(store.save(&state));

        let reopened = ProgressStore::new(FileStore::new(dir.path()));
        let loaded = reopened.load().unwrap();
        assert_eq!(loaded.completed_stop_ids, state.completed_stop_ids);
        assert_eq!(loaded.started_at, state.started_at);
    }
}
