//! Progression and answer checking for a museum stamp hunt.
//!
//! A run walks an ordered route of stops. Each stop is unlocked only after the
//! previous one is solved, and solving it awards a stamp and points.

pub mod config;
pub mod engine;
pub mod error;
pub mod route;
pub mod session;
pub mod store;

pub use config::Config;
pub use engine::{
    AnswerOutcome, EventSink, GameEvent, MatchResult, MessagePicker, PassportEntry,
    ProgressSummary, ProgressionEngine, RandomPicker, StopStatus, INCORRECT_MESSAGES, SUCCESS_MESSAGES,
};
pub use error::{RouteError, StoreError};
pub use route::{load_content, Character, Content, Route, Stop};
pub use session::Session;
pub use store::{
    FileStore, KeyValueStore, MemoryStore, ProgressStore, RunState, RunStatePatch, ENTRANCE,
    STORAGE_KEY,
};
