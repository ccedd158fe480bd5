pub mod backend;
pub mod progress;
pub mod state;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use progress::{ProgressStore, STORAGE_KEY};
pub use state::{RunState, RunStatePatch, ENTRANCE};
