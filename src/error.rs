use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Stop at position {position} has id {found}, expected {expected}")]
    OutOfOrder {
        position: usize,
        expected: u32,
        found: u32,
    },
    #[error("Room {0} is used by more than one stop")]
    DuplicateRoom(String),
    #[error("Stop {0} has no correct answer")]
    MissingAnswer(u32),
    #[error("Stop {0} has a blank alternative answer")]
    BlankAlternative(u32),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
}
