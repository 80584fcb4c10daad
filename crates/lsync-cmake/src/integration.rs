//! The seam between launch-sync and whatever knows the active CMake selection
//!
//! An integration answers three questions (active build preset, active
//! configure preset, active kit) and broadcasts change notifications. The
//! concrete sources live in sibling modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use lsync_core::prelude::*;
use lsync_core::ContextKind;

/// Capacity of every integration's event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Files whose presence marks a directory as a CMake project
pub const PROJECT_MARKERS: &[&str] = &["CMakeLists.txt", "CMakePresets.json"];

/// Notification fired by an integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum IntegrationEvent {
    /// One of the active selections changed
    ConfigurationChanged(ContextKind),
    /// The user switched to another project folder
    ActiveProjectChanged(PathBuf),
}

/// A CMake project known to the integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectHandle {
    pub root: PathBuf,
    pub name: String,
}

impl ProjectHandle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        Self { root, name }
    }
}

/// Source of the active CMake selection
///
/// Answers are raw labels: callers normalise empties and recognise the
/// placeholder sentinels themselves.
#[trait_variant::make(BuildToolIntegration: Send)]
pub trait LocalBuildToolIntegration {
    /// The selected build preset, if any
    async fn active_build_preset(&self) -> Result<Option<String>>;

    /// The selected configure preset, if any
    async fn active_configure_preset(&self) -> Result<Option<String>>;

    /// The selected kit, if any
    async fn active_kit(&self) -> Result<Option<String>>;

    /// The project rooted at `root`, when it is one
    async fn project(&self, root: &Path) -> Result<Option<ProjectHandle>>;

    /// Receiver for change notifications
    fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent>;
}

// Both trait variants are in scope here, so calls are spelled out in full.
impl<T: BuildToolIntegration + Send + Sync> BuildToolIntegration for Arc<T> {
    async fn active_build_preset(&self) -> Result<Option<String>> {
        BuildToolIntegration::active_build_preset(&**self).await
    }

    async fn active_configure_preset(&self) -> Result<Option<String>> {
        BuildToolIntegration::active_configure_preset(&**self).await
    }

    async fn active_kit(&self) -> Result<Option<String>> {
        BuildToolIntegration::active_kit(&**self).await
    }

    async fn project(&self, root: &Path) -> Result<Option<ProjectHandle>> {
        BuildToolIntegration::project(&**self, root).await
    }

    fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        BuildToolIntegration::subscribe(&**self)
    }
}

/// Project handle for `root` when it holds a CMake project marker
pub fn detect_project(root: &Path) -> Option<ProjectHandle> {
    if PROJECT_MARKERS.iter().any(|m| root.join(m).is_file()) {
        Some(ProjectHandle::new(root))
    } else {
        debug!("{} is not a CMake project", root.display());
        None
    }
}

/// Create the broadcast sender every integration owns
pub(crate) fn event_channel() -> broadcast::Sender<IntegrationEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}

/// Send `event` to current subscribers; having none is fine
pub(crate) fn publish(events: &broadcast::Sender<IntegrationEvent>, event: IntegrationEvent) {
    trace!("Integration event: {:?}", event);
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_detect_project_by_lists_file() {
        let dir = tempdir().unwrap();
        assert!(detect_project(dir.path()).is_none());

        std::fs::write(dir.path().join("CMakeLists.txt"), "project(x)").unwrap();
        let handle = detect_project(dir.path()).unwrap();
        assert_eq!(handle.root, dir.path());
    }

    #[test]
    fn test_detect_project_by_presets_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("CMakePresets.json"), "{}").unwrap();
        assert!(detect_project(dir.path()).is_some());
    }

    #[test]
    fn test_marker_directory_is_not_a_project() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("CMakeLists.txt")).unwrap();
        assert!(detect_project(dir.path()).is_none());
    }

    #[test]
    fn test_project_handle_name() {
        let handle = ProjectHandle::new("/work/engine");
        assert_eq!(handle.name, "engine");
    }

    #[test]
    fn test_event_serialization() {
        let json =
            serde_json::to_string(&IntegrationEvent::ConfigurationChanged(ContextKind::Kit))
                .unwrap();
        assert_eq!(json, r#"{"event":"configuration_changed","value":"kit"}"#);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let events = event_channel();
        publish(&events, IntegrationEvent::ConfigurationChanged(ContextKind::Kit));

        let mut rx = events.subscribe();
        publish(
            &events,
            IntegrationEvent::ActiveProjectChanged(PathBuf::from("/a")),
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            IntegrationEvent::ActiveProjectChanged(PathBuf::from("/a"))
        );
    }
}
