pub mod events;
pub mod matcher;
pub mod progression;

pub use events::{EventSink, GameEvent, ProgressSummary};
pub use matcher::{MessagePicker, RandomPicker, INCORRECT_MESSAGES, SUCCESS_MESSAGES};
pub use progression::{AnswerOutcome, MatchResult, PassportEntry, ProgressionEngine, StopStatus};
