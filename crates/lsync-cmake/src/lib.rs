//! # lsync-cmake - Build-Tool Integration
//!
//! Answers "which CMake preset or kit is active?" for launch-sync and
//! broadcasts change notifications.
//!
//! ## Public API
//!
//! - [`BuildToolIntegration`] - The integration trait (Send futures)
//! - [`IntegrationEvent`] - `ConfigurationChanged` / `ActiveProjectChanged`
//! - [`ProjectHandle`], [`detect_project()`] - CMake project detection
//! - [`StaticIntegration`] - Fixed labels (CLI overrides)
//! - [`CommandIntegration`] - Labels from external query commands
//! - [`StateFileIntegration`] - Labels from a watched JSON state file
//! - [`IntegrationSource`] - Runtime selection between the above
//!
//! With the `test-helpers` feature, `test_utils::FakeIntegration` provides
//! scripted answers for tests.

pub mod command;
pub mod fixed;
pub mod integration;
pub mod source;
pub mod state_file;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use command::{CommandIntegration, QueryCommand};
pub use fixed::StaticIntegration;
pub use integration::{
    detect_project, BuildToolIntegration, IntegrationEvent, LocalBuildToolIntegration,
    ProjectHandle, PROJECT_MARKERS,
};
pub use source::IntegrationSource;
pub use state_file::{IntegrationState, StateFileIntegration};
