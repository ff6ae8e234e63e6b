//! Shared types and utilities for the woodgas engine.

pub mod config;
pub mod time;
pub mod types;

pub use config::{ConfigError, GameConfig, WindowConfig};
pub use time::{FrameClock, FrameTime, FrameTimer};
pub use types::{EntityId, Transform};

pub fn crate_info() -> &'static str {
    "woodgas-common v0.1.0"
}
