use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::RouteError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: u32,
    pub room_id: String,
    pub title: String,
    pub riddle_text: String,
    pub hint: String,
    pub correct_answer: String,
    #[serde(default)]
    pub alternative_answers: Vec<String>,
    pub stamp_icon: String,
    pub stamp_label: String,
    #[serde(default = "default_points")]
    pub points: u32,
}

/// Points for a stop that does not set its own.
pub const DEFAULT_POINTS: u32 = 100;

fn default_points() -> u32 {
    DEFAULT_POINTS
}

impl Stop {
    /// The main answer followed by every alternative, in authored order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.correct_answer.as_str())
            .chain(self.alternative_answers.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub title: String,
    pub greeting: String,
}

/// Ordered, validated sequence of stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    stops: Vec<Stop>,
}

impl Route {
    /// Builds a route, rejecting stops that are out of order, share a room,
    /// or have a blank answer.
    pub fn new(stops: Vec<Stop>) -> Result<Self, RouteError> {
        let mut rooms = HashSet::new();
        for (position, stop) in stops.iter().enumerate() {
            let expected = position as u32 + 1;
            if stop.id != expected {
                return Err(RouteError::OutOfOrder {
                    position,
                    expected,
                    found: stop.id,
                });
            }
            if !rooms.insert(stop.room_id.as_str()) {
                return Err(RouteError::DuplicateRoom(stop.room_id.clone()));
            }
            if stop.correct_answer.trim().is_empty() {
                return Err(RouteError::MissingAnswer(stop.id));
            }
            // A blank alternative would be contained in every submission
            if stop.alternative_answers.iter().any(|a| a.trim().is_empty()) {
                return Err(RouteError::BlankAlternative(stop.id));
            }
        }
        Ok(Route { stops })
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn by_id(&self, id: u32) -> Option<&Stop> {
        self.stops.iter().find(|s| s.id == id)
    }

    /// Route position and stop for the room, if any stop lives there.
    pub fn by_room(&self, room_id: &str) -> Option<(usize, &Stop)> {
        self.stops
            .iter()
            .enumerate()
            .find(|(_, s)| s.room_id == room_id)
    }
}

#[cfg(test)]
pub(crate) fn sample_stop(id: u32, room: &str, answer: &str) -> Stop {
    Stop {
        id,
        room_id: room.to_string(),
        title: format!("Stop {}", id),
        riddle_text: format!("Riddle {}", id),
        hint: format!("Hint {}", id),
        correct_answer: answer.to_string(),
        alternative_answers: Vec::new(),
        stamp_icon: "*".to_string(),
        stamp_label: format!("Stamp {}", id),
        points: 10 * id,
    }
}
