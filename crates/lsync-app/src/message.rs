//! Messages processed by the engine loop

use std::path::PathBuf;

use lsync_cmake::IntegrationEvent;
use lsync_core::ContextKind;

/// Everything that can drive the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A preset or kit selection changed in the build tool
    ConfigurationChanged(ContextKind),

    /// The build tool switched to another project folder
    ActiveProjectChanged(PathBuf),

    /// Re-run the visibility pass without re-reading the context
    RefreshRequested,

    /// Stop the engine
    Quit,
}

impl From<IntegrationEvent> for Message {
    fn from(event: IntegrationEvent) -> Self {
        match event {
            IntegrationEvent::ConfigurationChanged(kind) => Message::ConfigurationChanged(kind),
            IntegrationEvent::ActiveProjectChanged(path) => Message::ActiveProjectChanged(path),
        }
    }
}
