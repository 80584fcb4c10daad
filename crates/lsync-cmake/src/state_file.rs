//! Integration backed by a JSON state file the editor host keeps current
//!
//! The host writes `{ "buildPreset", "configurePreset", "kit", "activeProject" }`
//! whenever the selection changes. Queries read the file fresh; a debounced
//! watcher compares successive versions and emits one event per changed
//! field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};

use lsync_core::prelude::*;
use lsync_core::ContextKind;

use crate::integration::{
    detect_project, event_channel, publish, BuildToolIntegration, IntegrationEvent, ProjectHandle,
};

/// Default debounce for state file changes in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Contents of the state file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationState {
    pub build_preset: Option<String>,
    pub configure_preset: Option<String>,
    pub kit: Option<String>,
    pub active_project: Option<PathBuf>,
}

impl IntegrationState {
    /// Parse state file content; blank content is an empty state
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Load from disk; a missing file is an empty state
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Events describing the move from `self` to `newer`
    pub fn changes(&self, newer: &IntegrationState) -> Vec<IntegrationEvent> {
        let mut events = Vec::new();
        if let Some(project) = newer
            .active_project
            .as_ref()
            .filter(|p| self.active_project.as_ref() != Some(*p))
        {
            events.push(IntegrationEvent::ActiveProjectChanged(project.clone()));
        }
        if self.build_preset != newer.build_preset {
            events.push(IntegrationEvent::ConfigurationChanged(ContextKind::BuildPreset));
        }
        if self.configure_preset != newer.configure_preset {
            events.push(IntegrationEvent::ConfigurationChanged(
                ContextKind::ConfigurePreset,
            ));
        }
        if self.kit != newer.kit {
            events.push(IntegrationEvent::ConfigurationChanged(ContextKind::Kit));
        }
        events
    }
}

/// Reads the active selection from a watched state file
#[derive(Debug)]
pub struct StateFileIntegration {
    path: PathBuf,
    debounce: Duration,
    events: broadcast::Sender<IntegrationEvent>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl StateFileIntegration {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            events: event_channel(),
            stop_tx: None,
        }
    }

    /// Set debounce duration in milliseconds
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce = Duration::from_millis(ms);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the watcher is running
    pub fn is_watching(&self) -> bool {
        self.stop_tx.is_some()
    }

    /// Start watching the state file.
    ///
    /// Returns once the watch is registered, so changes made after this call
    /// are never missed.
    pub async fn watch(&mut self) -> Result<()> {
        if self.is_watching() {
            return Ok(());
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let path = self.path.clone();
        let debounce = self.debounce;
        let events = self.events.clone();

        tokio::task::spawn_blocking(move || {
            run_watcher(path, dir, debounce, events, ready_tx, stop_rx);
        });

        ready_rx
            .await
            .map_err(|_| Error::integration_unavailable("state file watcher exited early"))??;

        self.stop_tx = Some(stop_tx);
        info!("Watching state file {}", self.path.display());
        Ok(())
    }

    /// Stop the watcher
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Broadcast an event to subscribers
    pub fn emit(&self, event: IntegrationEvent) {
        publish(&self.events, event);
    }

    async fn read_state(&self, query: &str) -> Result<IntegrationState> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => IntegrationState::parse(&content)
                .map_err(|e| Error::query(query, format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IntegrationState::default()),
            Err(e) => Err(Error::query(
                query,
                format!("{}: {}", self.path.display(), e),
            )),
        }
    }
}

impl BuildToolIntegration for StateFileIntegration {
    async fn active_build_preset(&self) -> Result<Option<String>> {
        Ok(self.read_state("activeBuildPreset").await?.build_preset)
    }

    async fn active_configure_preset(&self) -> Result<Option<String>> {
        Ok(self
            .read_state("activeConfigurePreset")
            .await?
            .configure_preset)
    }

    async fn active_kit(&self) -> Result<Option<String>> {
        Ok(self.read_state("activeKit").await?.kit)
    }

    async fn project(&self, root: &Path) -> Result<Option<ProjectHandle>> {
        Ok(detect_project(root))
    }

    fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.events.subscribe()
    }
}

impl Drop for StateFileIntegration {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Internal: run the blocking watcher until stopped
fn run_watcher(
    path: PathBuf,
    dir: PathBuf,
    debounce: Duration,
    events: broadcast::Sender<IntegrationEvent>,
    ready_tx: oneshot::Sender<Result<()>>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let file_name = path.file_name().map(|n| n.to_os_string());
    let mut last = IntegrationState::load(&path).unwrap_or_else(|e| {
        warn!("Ignoring unreadable state file {}: {}", path.display(), e);
        IntegrationState::default()
    });
    let watched = path.clone();

    let debouncer_result = new_debouncer(debounce, None, move |result: DebounceEventResult| {
        match result {
            Ok(batch) => {
                // The directory is watched; only our file matters
                let touched = batch.iter().any(|event| {
                    event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name)
                });
                if !touched {
                    return;
                }

                let current = match IntegrationState::load(&watched) {
                    Ok(state) => state,
                    Err(e) => {
                        // Usually a write in progress; the next event carries the full file
                        debug!("State file not readable yet: {}", e);
                        return;
                    }
                };

                for event in last.changes(&current) {
                    publish(&events, event);
                }
                last = current;
            }
            Err(errors) => {
                for error in errors {
                    warn!("State file watcher error: {:?}", error);
                }
            }
        }
    });

    let mut debouncer = match debouncer_result {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to create state file watcher: {}", e);
            let _ = ready_tx.send(Err(Error::integration_unavailable(format!(
                "cannot watch {}: {}",
                path.display(),
                e
            ))));
            return;
        }
    };

    if let Err(e) = debouncer.watch(&dir, RecursiveMode::NonRecursive) {
        let _ = ready_tx.send(Err(Error::integration_unavailable(format!(
            "cannot watch {}: {}",
            dir.display(),
            e
        ))));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    // Keep running until stop signal
    loop {
        match stop_rx.try_recv() {
            Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                info!("State file watcher stopping");
                break;
            }
            Err(oneshot::error::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_camel_case_fields() {
        let state = IntegrationState::parse(
            r#"{"buildPreset": "debug", "kit": null, "activeProject": "/w/app", "extra": 1}"#,
        )
        .unwrap();
        assert_eq!(state.build_preset.as_deref(), Some("debug"));
        assert_eq!(state.configure_preset, None);
        assert_eq!(state.kit, None);
        assert_eq!(state.active_project, Some(PathBuf::from("/w/app")));
    }

    #[test]
    fn test_parse_blank_and_invalid() {
        assert_eq!(IntegrationState::parse("  \n").unwrap(), IntegrationState::default());
        assert!(IntegrationState::parse("{ nope").is_err());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let state = IntegrationState::load(&dir.path().join("state.json")).unwrap();
        assert_eq!(state, IntegrationState::default());
    }

    #[test]
    fn test_changes_per_field() {
        let before = IntegrationState {
            build_preset: Some("debug".into()),
            kit: Some("gcc".into()),
            ..Default::default()
        };
        let after = IntegrationState {
            build_preset: Some("release".into()),
            configure_preset: Some("base".into()),
            kit: Some("gcc".into()),
            active_project: Some(PathBuf::from("/w/other")),
        };

        assert_eq!(
            before.changes(&after),
            vec![
                IntegrationEvent::ActiveProjectChanged(PathBuf::from("/w/other")),
                IntegrationEvent::ConfigurationChanged(ContextKind::BuildPreset),
                IntegrationEvent::ConfigurationChanged(ContextKind::ConfigurePreset),
            ]
        );
        assert!(after.changes(&after).is_empty());
    }

    #[test]
    fn test_clearing_active_project_is_not_an_event() {
        let before = IntegrationState {
            active_project: Some(PathBuf::from("/w/app")),
            ..Default::default()
        };
        assert!(before.changes(&IntegrationState::default()).is_empty());
    }

    #[tokio::test]
    async fn test_queries_read_current_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let integration = StateFileIntegration::new(&path);

        assert_eq!(integration.active_kit().await.unwrap(), None);

        std::fs::write(&path, r#"{"kit": "clang-17", "configurePreset": "base"}"#).unwrap();
        assert_eq!(integration.active_kit().await.unwrap(), Some("clang-17".into()));
        assert_eq!(
            integration.active_configure_preset().await.unwrap(),
            Some("base".into())
        );
        assert_eq!(integration.active_build_preset().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_file_is_query_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ broken").unwrap();

        let err = StateFileIntegration::new(&path).active_kit().await.unwrap_err();
        assert!(matches!(err, Error::Query { .. }));
    }

    #[tokio::test]
    async fn test_watcher_emits_on_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"buildPreset": "debug"}"#).unwrap();

        let mut integration = StateFileIntegration::new(&path).with_debounce_ms(50);
        let mut rx = integration.subscribe();
        integration.watch().await.unwrap();
        assert!(integration.is_watching());

        std::fs::write(&path, r#"{"buildPreset": "release"}"#).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no event within timeout")
            .unwrap();
        assert_eq!(
            event,
            IntegrationEvent::ConfigurationChanged(ContextKind::BuildPreset)
        );

        integration.stop();
        assert!(!integration.is_watching());
    }

    #[tokio::test]
    async fn test_watch_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".lsync").join("state.json");

        let mut integration = StateFileIntegration::new(&path);
        integration.watch().await.unwrap();
        assert!(dir.path().join(".lsync").is_dir());
    }
}
