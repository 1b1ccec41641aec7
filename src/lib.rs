// Library surface for headless/integration tests and reuse.
// Terminal setup and argument parsing stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod typing_policy;
pub mod ui;

pub use error::{Error, Result};
pub use session::{Judgment, Metrics, Phase, Snapshot, TimerHandle, TypingSession};
