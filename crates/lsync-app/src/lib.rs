//! lsync-app - Context tracking and launch file orchestration for launch-sync
//!
//! This crate holds the per-root settings, the context tracker, the launch
//! file store and patcher, and the `Engine` that ties them together behind a
//! message loop.

pub mod config;
pub mod engine;
pub mod engine_event;
pub mod integration;
pub mod message;
pub mod patcher;
pub mod signals;
pub mod store;
pub mod tracker;

// Re-export primary types
pub use config::Settings;
pub use engine::{Engine, PassSummary, RootConfig};
pub use engine_event::EngineEvent;
pub use integration::{build_integration, ContextOverride};
pub use message::Message;
pub use patcher::{apply_to_document, PassOutcome};
pub use store::{FsLaunchStore, LaunchStore};
pub use tracker::ContextTracker;
