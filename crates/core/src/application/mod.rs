// Application Layer - Use Cases

pub mod banner;
pub mod constants;
pub mod fanout;
pub mod runner;

// Re-exports
pub use fanout::{FanOutWriter, SharedBuffer, Sink};
pub use runner::JobRunner;
