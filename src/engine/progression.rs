use chrono::Utc;

use super::events::{GameEvent, ProgressSummary};
use super::matcher::{self, MessagePicker, RandomPicker, INCORRECT_MESSAGES, SUCCESS_MESSAGES};
use crate::route::{Route, Stop};
use crate::store::{RunState, ENTRANCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    Completed,
    Active,
    Locked,
    /// No stop lives in this room.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    Correct {
        stop_id: u32,
        points_awarded: u32,
        message: String,
    },
    Incorrect {
        message: String,
    },
    EmptyAnswer,
    NoActiveStop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub outcome: AnswerOutcome,
    /// Empty unless the answer was correct.
    pub events: Vec<GameEvent>,
}

impl MatchResult {
    fn without_events(outcome: AnswerOutcome) -> Self {
        MatchResult {
            outcome,
            events: Vec::new(),
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self.outcome, AnswerOutcome::Correct { .. })
    }
}

/// One line of the passport: a stop's stamp and whether it was earned.
#[derive(Debug, Clone, PartialEq)]
pub struct PassportEntry {
    pub stop_id: u32,
    pub stamp_icon: String,
    pub stamp_label: String,
    pub collected: bool,
}

/// Rules for moving a [`RunState`] along a [`Route`].
///
/// The engine never holds run state itself. Every operation takes the state it
/// reads or mutates, and callers persist the result.
pub struct ProgressionEngine {
    route: Route,
    picker: Box<dyn MessagePicker>,
}

impl std::fmt::Debug for ProgressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl ProgressionEngine {
    pub fn new(route: Route) -> Self {
        Self::with_picker(route, RandomPicker)
    }

    pub fn with_picker(route: Route, picker: impl MessagePicker + 'static) -> Self {
        ProgressionEngine {
            route,
            picker: Box::new(picker),
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn start_new(&self, character_id: &str) -> RunState {
        tracing::info!(character = character_id, "starting new run");
        RunState {
            selected_character_id: Some(character_id.to_string()),
            started_at: Some(Utc::now()),
            ..RunState::default()
        }
    }

    /// Hands back `saved` if it describes a run this route can continue.
    pub fn resume(&self, saved: RunState) -> Option<RunState> {
        if saved.selected_character_id.is_none() {
            tracing::warn!("saved run has no character, not resumable");
            return None;
        }
        let index = saved.active_stop_index;
        if index > self.route.len() {
            tracing::warn!(index, total = self.route.len(), "saved stop index out of range");
            return None;
        }
        let prefix_ids = self.route.stops()[..index].iter().map(|s| s.id);
        if !prefix_ids.eq(saved.completed_stop_ids.iter().copied()) {
            tracing::warn!("saved completed stops do not match the route");
            return None;
        }
        if saved.completed_at.is_some() != (index == self.route.len()) {
            tracing::warn!("saved completion time disagrees with progress");
            return None;
        }
        Some(saved)
    }

    pub fn active_stop(&self, state: &RunState) -> Option<&Stop> {
        self.route.get(state.active_stop_index)
    }

    pub fn stop_status(&self, state: &RunState, room_id: &str) -> StopStatus {
        let Some((index, stop)) = self.route.by_room(room_id) else {
            return StopStatus::None;
        };
        if state.completed_stop_ids.contains(&stop.id) {
            StopStatus::Completed
        } else if index == state.active_stop_index {
            StopStatus::Active
        } else {
            StopStatus::Locked
        }
    }

    pub fn can_interact(&self, state: &RunState, room_id: &str) -> bool {
        self.stop_status(state, room_id) == StopStatus::Active
    }

    /// Checks `raw` against the active stop and advances the run on a match.
    /// Any other outcome leaves `state` untouched.
    pub fn submit_answer(&self, state: &mut RunState, raw: &str) -> MatchResult {
        let Some(stop) = self.active_stop(state) else {
            return MatchResult::without_events(AnswerOutcome::NoActiveStop);
        };
        if raw.trim().is_empty() {
            return MatchResult::without_events(AnswerOutcome::EmptyAnswer);
        }

        if !matcher::matches_any(raw, stop.candidates()) {
            tracing::debug!(stop = stop.id, "incorrect answer");
            let message = matcher::choose(self.picker.as_ref(), INCORRECT_MESSAGES);
            return MatchResult::without_events(AnswerOutcome::Incorrect {
                message: message.to_string(),
            });
        }

        state.completed_stop_ids.push(stop.id);
        state.points = state.points.saturating_add(stop.points);
        state.active_stop_index += 1;
        tracing::debug!(stop = stop.id, points = state.points, "stop completed");

        let mut events = vec![
            GameEvent::StampCollected(stop.clone()),
            GameEvent::ProgressUpdated(self.progress_summary(state)),
        ];
        if self.is_complete(state) {
            state.completed_at = Some(Utc::now());
            tracing::info!(points = state.points, "run completed");
            events.push(GameEvent::RunCompleted(state.clone()));
        }

        let message = matcher::choose(self.picker.as_ref(), SUCCESS_MESSAGES);
        MatchResult {
            outcome: AnswerOutcome::Correct {
                stop_id: stop.id,
                points_awarded: stop.points,
                message: message.to_string(),
            },
            events,
        }
    }

    /// Records that the hint for `stop_id` was seen and returns its text.
    pub fn use_hint(&self, state: &mut RunState, stop_id: u32) -> Option<String> {
        let stop = self.route.by_id(stop_id)?;
        if !state.has_used_hint(stop_id) {
            state.hints_used_stop_ids.push(stop_id);
        }
        Some(stop.hint.clone())
    }

    pub fn is_complete(&self, state: &RunState) -> bool {
        state.active_stop_index >= self.route.len()
    }

    pub fn progress_summary(&self, state: &RunState) -> ProgressSummary {
        let completed = state.completed_stop_ids.len();
        let total = self.route.len();
        let percentage = if total == 0 {
            0
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u32
        };
        ProgressSummary {
            completed,
            total,
            percentage,
            points: state.points,
            is_complete: self.is_complete(state),
        }
    }

    /// Moves the player to the entrance or to an unlocked room.
    pub fn enter_room(&self, state: &mut RunState, room_id: &str) -> bool {
        let allowed = room_id == ENTRANCE
            || matches!(
                self.stop_status(state, room_id),
                StopStatus::Active | StopStatus::Completed
            );
        if allowed {
            state.current_room_id = room_id.to_string();
        }
        allowed
    }

    pub fn passport(&self, state: &RunState) -> Vec<PassportEntry> {
        self.route
            .stops()
            .iter()
            .map(|stop| PassportEntry {
                stop_id: stop.id,
                stamp_icon: stop.stamp_icon.clone(),
                stamp_label: stop.stamp_label.clone(),
                collected: state.completed_stop_ids.contains(&stop.id),
            })
            .collect()
    }
}
