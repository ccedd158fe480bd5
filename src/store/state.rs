use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Room the player stands in before entering any stop.
pub const ENTRANCE: &str = "entrance";

/// Durable snapshot of one play-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunState {
    pub selected_character_id: Option<String>,
    pub current_room_id: String,
    /// Route index of the next unsolved stop. Equals the route length once
    /// every stop is solved.
    pub active_stop_index: usize,
    /// Solved stop ids in solve order. Always the first `active_stop_index`
    /// ids of the route.
    pub completed_stop_ids: Vec<u32>,
    pub hints_used_stop_ids: Vec<u32>,
    pub points: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for RunState {
    fn default() -> Self {
        RunState {
            selected_character_id: None,
            current_room_id: ENTRANCE.to_string(),
            active_stop_index: 0,
            completed_stop_ids: Vec::new(),
            hints_used_stop_ids: Vec::new(),
            points: 0,
            started_at: None,
            completed_at: None,
            saved_at: None,
        }
    }
}

impl RunState {
    pub fn has_used_hint(&self, stop_id: u32) -> bool {
        self.hints_used_stop_ids.contains(&stop_id)
    }

    /// Overwrites every field the patch carries and leaves the rest alone.
    pub fn apply(&mut self, patch: RunStatePatch) {
        if let Some(v) = patch.selected_character_id {
            self.selected_character_id = v;
        }
        if let Some(v) = patch.current_room_id {
            self.current_room_id = v;
        }
        if let Some(v) = patch.active_stop_index {
            self.active_stop_index = v;
        }
        if let Some(v) = patch.completed_stop_ids {
            self.completed_stop_ids = v;
        }
        if let Some(v) = patch.hints_used_stop_ids {
            self.hints_used_stop_ids = v;
        }
        if let Some(v) = patch.points {
            self.points = v;
        }
        if let Some(v) = patch.started_at {
            self.started_at = v;
        }
        if let Some(v) = patch.completed_at {
            self.completed_at = v;
        }
    }
}

/// Partial update for [`RunState`]. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatePatch {
    pub selected_character_id: Option<Option<String>>,
    pub current_room_id: Option<String>,
    pub active_stop_index: Option<usize>,
    pub completed_stop_ids: Option<Vec<u32>>,
    pub hints_used_stop_ids: Option<Vec<u32>>,
    pub points: Option<u32>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}
