use std::path::Path;

use stamp_hunt::{
    load_content, AnswerOutcome, Content, FileStore, GameEvent, MemoryStore, ProgressStore,
    ProgressionEngine, Session, SUCCESS_MESSAGES,
};
use tempfile::TempDir;

fn shipped_content() -> Content {
    load_content(&Path::new(env!("CARGO_MANIFEST_DIR")).join("content")).unwrap()
}

const ANSWERS: [&str; 5] = ["мърквичка", "книга", "вазов", "thinking", "gold"];

#[test]
fn full_run_through_shipped_route() {
    let content = shipped_content();
    assert_eq!(content.route.len(), 5);
    let engine = ProgressionEngine::new(content.route.clone());
    let mut state = engine.start_new("owl");

    let mut expected_points = 0;
    for (i, answer) in ANSWERS.iter().enumerate() {
        let stop = engine.active_stop(&state).unwrap().clone();
        assert_eq!(stop.id as usize, i + 1);

        let result = engine.submit_answer(&mut state, answer);
        match &result.outcome {
            AnswerOutcome::Correct { stop_id, message, .. } => {
                assert_eq!(*stop_id, stop.id);
                assert!(SUCCESS_MESSAGES.contains(&message.as_str()));
            }
            other => panic!("stop {} rejected {:?}: {:?}", stop.id, answer, other),
        }
        expected_points += stop.points;

        assert_eq!(state.active_stop_index, i + 1);
        assert_eq!(state.completed_stop_ids.len(), state.active_stop_index);
        assert_eq!(state.points, expected_points);
        assert_eq!(engine.is_complete(&state), i == 4);
        assert_eq!(state.completed_at.is_some(), i == 4);
    }

    assert_eq!(state.completed_stop_ids, vec![1, 2, 3, 4, 5]);
    let summary = engine.progress_summary(&state);
    assert_eq!(summary.percentage, 100);
    assert!(summary.is_complete);
    assert_eq!(
        engine.submit_answer(&mut state, "gold").outcome,
        AnswerOutcome::NoActiveStop
    );
}

#[test]
fn saved_session_resumes_from_disk() {
    let dir = TempDir::new().unwrap();
    let content = shipped_content();

    let mut session = Session::start_new(
        ProgressionEngine::new(content.route.clone()),
        ProgressStore::new(FileStore::new(dir.path())),
        "fox",
    );
    assert!(session.submit_answer("  МЪРКВИЧКА  ").is_correct());
    assert!(session.submit_answer("it's a book").is_correct());
    assert_eq!(session.use_hint(3).as_deref(), Some(content.route.stops()[2].hint.as_str()));
    drop(session);

    let resumed = Session::resume(
        ProgressionEngine::new(content.route.clone()),
        ProgressStore::new(FileStore::new(dir.path())),
    )
    .ok()
    .unwrap();
    assert_eq!(resumed.state().selected_character_id.as_deref(), Some("fox"));
    assert_eq!(resumed.state().completed_stop_ids, vec![1, 2]);
    assert_eq!(resumed.state().hints_used_stop_ids, vec![3]);
    assert!(resumed.state().saved_at.is_some());
}

#[test]
fn reset_leaves_nothing_to_resume() {
    let content = shipped_content();
    let mut session = Session::start_new(
        ProgressionEngine::new(content.route.clone()),
        ProgressStore::new(MemoryStore::new()),
        "cat",
    );
    for answer in &ANSWERS[..3] {
        session.submit_answer(answer);
    }

    let (cleared, engine, store) = session.reset();
    assert!(cleared);
    assert!(store.load().is_none());
    assert!(Session::resume(engine, store).is_err());
}

#[test]
fn completion_event_reaches_the_host() {
    let content = shipped_content();
    let (tx, rx) = std::sync::mpsc::channel::<GameEvent>();
    let mut session = Session::start_new(
        ProgressionEngine::new(content.route.clone()),
        ProgressStore::new(MemoryStore::new()),
        "owl",
    )
    .with_sink(tx);

    for answer in ANSWERS {
        session.submit_answer(answer);
    }

    let events: Vec<GameEvent> = rx.try_iter().collect();
    let stamps = events
        .iter()
        .filter(|e| matches!(e, GameEvent::StampCollected(_)))
        .count();
    assert_eq!(stamps, 5);
    assert!(matches!(
        events.last(),
        Some(GameEvent::RunCompleted(state)) if state.points == 100
    ));
}
