use serde::Serialize;
use std::sync::mpsc::Sender;

use crate::route::Stop;
use crate::store::RunState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
    pub points: u32,
    pub is_complete: bool,
}

/// Things the host may want to react to after a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    StampCollected(Stop),
    ProgressUpdated(ProgressSummary),
    RunCompleted(RunState),
}

pub trait EventSink {
    fn notify(&mut self, event: &GameEvent);
}

impl EventSink for Sender<GameEvent> {
    fn notify(&mut self, event: &GameEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.send(event.clone());
    }
}
