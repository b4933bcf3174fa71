//! SOCD (simultaneous opposite cardinal direction) resolver for `A`/`D`.
//!
//! Physical transitions are captured through Raw Input, resolved with
//! last-input priority, and corrected with tagged synthetic key events.

pub mod config;
pub mod error;
#[cfg(windows)]
pub mod lifecycle;
pub mod logging;
pub mod pipeline;
pub mod rawinput;
#[cfg(windows)]
pub mod signal;
pub mod state;
mod util;

pub use config::AppConfig;
pub use error::StartupError;
pub use pipeline::Pipeline;
pub use state::{Direction, SocdState, SyntheticEvent, TrackedKey};
