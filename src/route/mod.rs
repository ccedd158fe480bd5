pub mod loader;
pub mod types;

pub use loader::{load_characters, load_content, load_route, load_stop, Content};
pub use types::{Character, Route, Stop};
