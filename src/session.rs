//! The single owner of a live run.
//!
//! A `Session` holds the [`RunState`] with exclusive mutation rights, saves it
//! after every change and forwards engine events to an optional observer.

use crate::engine::{EventSink, MatchResult, ProgressionEngine};
use crate::store::{KeyValueStore, ProgressStore, RunState};

pub struct Session<B: KeyValueStore> {
    engine: ProgressionEngine,
    store: ProgressStore<B>,
    state: RunState,
    sink: Option<Box<dyn EventSink>>,
    last_save_ok: bool,
}

impl<B: KeyValueStore> Session<B> {
    pub fn start_new(
        engine: ProgressionEngine,
        mut store: ProgressStore<B>,
        character_id: &str,
    ) -> Self {
        let state = engine.start_new(character_id);
        let last_save_ok = store.save(&state);
        Session {
            engine,
            store,
            state,
            sink: None,
            last_save_ok,
        }
    }

    /// Continues the saved run, or gives the engine and store back when there
    /// is nothing resumable.
    pub fn resume(
        engine: ProgressionEngine,
        store: ProgressStore<B>,
    ) -> Result<Self, (ProgressionEngine, ProgressStore<B>)> {
        match store.load().and_then(|saved| engine.resume(saved)) {
            Some(state) => {
                tracing::info!(stop_index = state.active_stop_index, "resuming saved run");
                Ok(Session {
                    engine,
                    store,
                    state,
                    sink: None,
                    last_save_ok: true,
                })
            }
            None => Err((engine, store)),
        }
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// Whether the most recent write reached the store. The in-memory run is
    /// still ahead of storage when this is false; the next save retries.
    pub fn last_save_ok(&self) -> bool {
        self.last_save_ok
    }

    /// Writes the current state again, e.g. after a failed save.
    pub fn save(&mut self) -> bool {
        self.last_save_ok = self.store.save(&self.state);
        self.last_save_ok
    }

    pub fn submit_answer(&mut self, raw: &str) -> MatchResult {
        let result = self.engine.submit_answer(&mut self.state, raw);
        if result.is_correct() {
            self.save();
        }
        if let Some(sink) = self.sink.as_mut() {
            for event in &result.events {
                sink.notify(event);
            }
        }
        result
    }

    pub fn use_hint(&mut self, stop_id: u32) -> Option<String> {
        let already_used = self.state.has_used_hint(stop_id);
        let hint = self.engine.use_hint(&mut self.state, stop_id)?;
        if !already_used {
            self.save();
        }
        Some(hint)
    }

    pub fn enter_room(&mut self, room_id: &str) -> bool {
        if self.state.current_room_id == room_id {
            return true;
        }
        let moved = self.engine.enter_room(&mut self.state, room_id);
        if moved {
            self.save();
        }
        moved
    }

    /// Erases the saved run. Returns whether the erase succeeded, with the
    /// engine and store for starting over.
    pub fn reset(mut self) -> (bool, ProgressionEngine, ProgressStore<B>) {
        let cleared = self.store.clear();
        (cleared, self.engine, self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameEvent;
    use crate::route::types::sample_stop;
    use crate::route::Route;
    use crate::store::MemoryStore;
    use std::sync::mpsc;

    fn engine() -> ProgressionEngine {
        let route = Route::new(vec![
            sample_stop(1, "hall", "book"),
            sample_stop(2, "gallery", "vase"),
        ])
        .unwrap();
        ProgressionEngine::with_picker(route, |_len: usize| 0)
    }

    #[test]
    fn start_new_persists_immediately() {
        let session = Session::start_new(engine(), ProgressStore::new(MemoryStore::new()), "owl");
        assert_eq!(
            session.store.load().unwrap().selected_character_id.as_deref(),
            Some("owl")
        );
    }

    #[test]
    fn correct_answer_is_saved_and_forwarded() {
        let (tx, rx) = mpsc::channel::<GameEvent>();
        let mut session =
            Session::start_new(engine(), ProgressStore::new(MemoryStore::new()), "owl")
                .with_sink(tx);

        assert!(!session.submit_answer("lamp").is_correct());
        assert!(rx.try_recv().is_err());

        assert!(session.submit_answer("book").is_correct());
        assert!(matches!(rx.try_recv(), Ok(GameEvent::StampCollected(s)) if s.id == 1));
        assert!(matches!(rx.try_recv(), Ok(GameEvent::ProgressUpdated(_))));
        assert_eq!(session.store.load().unwrap().completed_stop_ids, vec![1]);
    }

    #[test]
    fn hints_and_moves_are_saved() {
        let mut session =
            Session::start_new(engine(), ProgressStore::new(MemoryStore::new()), "owl");
        assert_eq!(session.use_hint(1).as_deref(), Some("Hint 1"));
        assert!(session.enter_room("hall"));
        assert!(!session.enter_room("gallery"));

        let saved = session.store.load().unwrap();
        assert_eq!(saved.hints_used_stop_ids, vec![1]);
        assert_eq!(saved.current_room_id, "hall");
    }

    #[test]
    fn save_failures_reach_the_host() {
        let mut session =
            Session::start_new(engine(), ProgressStore::new(MemoryStore::with_quota(16)), "owl");
        assert!(!session.last_save_ok());

        assert!(session.submit_answer("book").is_correct());
        assert_eq!(session.state().active_stop_index, 1);
        assert!(!session.last_save_ok());
        assert!(session.store.load().is_none());
        assert!(!session.save());
    }

    #[test]
    fn successful_saves_are_reported() {
        let mut session =
            Session::start_new(engine(), ProgressStore::new(MemoryStore::new()), "owl");
        assert!(session.last_save_ok());
        session.submit_answer("book");
        assert!(session.last_save_ok());
        assert!(session.save());
    }

    #[test]
    fn resume_picks_up_saved_run() {
        let mut session =
            Session::start_new(engine(), ProgressStore::new(MemoryStore::new()), "owl");
        session.submit_answer("book");
        let resumed = Session::resume(session.engine, session.store).ok().unwrap();
        assert_eq!(resumed.state().active_stop_index, 1);
        assert_eq!(resumed.state().points, 10);
    }

    #[test]
    fn reset_forgets_the_run() {
        let mut session =
            Session::start_new(engine(), ProgressStore::new(MemoryStore::new()), "owl");
        session.submit_answer("book");
        let (cleared, engine, store) = session.reset();
        assert!(cleared);
        assert!(store.load().is_none());
        assert!(Session::resume(engine, store).is_err());
    }
}
