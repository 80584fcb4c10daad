//! Engine - orchestrates context tracking and launch file passes
//!
//! The engine owns the roots, the tracker, the store and the integration. It
//! processes one [`Message`] at a time to completion: re-read the context if
//! the message asks for it, then run one pass over every root's launch file
//! in order. Per-file failures are reported as events and never stop the
//! loop.

use std::path::{Path, PathBuf};

use tokio::sync::{broadcast, mpsc};

use lsync_cmake::BuildToolIntegration;
use lsync_core::prelude::*;
use lsync_core::{BuildContext, ContextKind};

use crate::config::{load_settings, IntegrationSettings, Settings};
use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::patcher::{apply_to_document, PassOutcome};
use crate::signals::spawn_signal_handler;
use crate::store::{FsLaunchStore, LaunchStore};
use crate::tracker::ContextTracker;

/// Capacity of the message channel
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A workspace root and its settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    pub root: PathBuf,
    pub settings: Settings,
}

impl RootConfig {
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    /// Root with settings from its `.lsync/config.toml`
    pub fn load(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let settings = load_settings(&root);
        Self { root, settings }
    }

    /// Absolute path of this root's launch file
    pub fn launch_path(&self) -> PathBuf {
        self.root.join(&self.settings.launch.path)
    }
}

/// Per-file tallies for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub absent: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Drives context refreshes and launch file passes
pub struct Engine<I, S = FsLaunchStore> {
    roots: Vec<RootConfig>,
    active_root: Option<PathBuf>,
    tracker: ContextTracker,
    store: S,
    integration: I,
    msg_tx: mpsc::Sender<Message>,
    msg_rx: mpsc::Receiver<Message>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl<I: BuildToolIntegration> Engine<I, FsLaunchStore> {
    /// Engine writing to the local filesystem
    pub fn new(integration: I, roots: Vec<RootConfig>) -> Self {
        Self::with_store(integration, FsLaunchStore::new(), roots)
    }
}

impl<I: BuildToolIntegration, S: LaunchStore> Engine<I, S> {
    /// Engine with a custom store.
    ///
    /// The query timeout comes from the first root's settings.
    pub fn with_store(integration: I, store: S, roots: Vec<RootConfig>) -> Self {
        let query_timeout = roots
            .first()
            .map(|r| r.settings.integration.query_timeout())
            .unwrap_or_else(|| IntegrationSettings::default().query_timeout());
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            roots,
            active_root: None,
            tracker: ContextTracker::new(query_timeout),
            store,
            integration,
            msg_tx,
            msg_rx,
            event_tx,
        }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Sender for feeding messages into `run()`
    pub fn sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn roots(&self) -> &[RootConfig] {
        &self.roots
    }

    pub fn active_root(&self) -> Option<&Path> {
        self.active_root.as_deref()
    }

    pub fn integration(&self) -> &I {
        &self.integration
    }

    pub fn tracker(&self) -> &ContextTracker {
        &self.tracker
    }

    /// Current context snapshot
    pub async fn context(&self) -> BuildContext {
        self.tracker.snapshot().await
    }

    /// Establish the context and run the first pass
    pub async fn start(&mut self) -> PassSummary {
        info!("Starting with {} root(s)", self.roots.len());
        self.initialize_context().await;
        self.run_pass().await
    }

    /// Manual "refresh configurations now": a pass without re-reading the context
    pub async fn refresh_all(&mut self) -> PassSummary {
        debug!("Manual refresh");
        self.run_pass().await
    }

    /// Handle one message to completion.
    ///
    /// Returns `false` when the engine should stop.
    pub async fn process_message(&mut self, message: Message) -> bool {
        match message {
            Message::ConfigurationChanged(kind) => {
                self.refresh_context(kind).await;
                self.run_pass().await;
            }
            Message::ActiveProjectChanged(path) => {
                self.activate_project(&path).await;
            }
            Message::RefreshRequested => {
                self.refresh_all().await;
            }
            Message::Quit => {
                info!("Quit requested");
                return false;
            }
        }
        true
    }

    /// Run until `Quit`: bridges integration events and OS signals into the
    /// message channel, performs the first pass, then processes messages.
    pub async fn run(&mut self) -> Result<()> {
        self.spawn_integration_bridge();
        spawn_signal_handler(self.msg_tx.clone());

        self.start().await;

        while let Some(message) = self.msg_rx.recv().await {
            if !self.process_message(message).await {
                break;
            }
        }

        let _ = self.event_tx.send(EngineEvent::Shutdown);
        info!("Engine stopped");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Context
    // ─────────────────────────────────────────────────────────

    async fn initialize_context(&mut self) {
        if let Some(context) = self.tracker.initialize(&self.integration).await {
            self.emit(EngineEvent::ContextChanged { context });
        }
    }

    async fn refresh_context(&mut self, kind: ContextKind) {
        if let Some(context) = self.tracker.refresh(kind, &self.integration).await {
            self.emit(EngineEvent::ContextChanged { context });
        }
    }

    async fn activate_project(&mut self, path: &Path) {
        let handle = match self.integration.project(path).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                info!("Ignoring active project {}: not a CMake project", path.display());
                return;
            }
            Err(e) => {
                warn!("Cannot resolve project {}: {}", path.display(), e);
                return;
            }
        };

        if !self.roots.iter().any(|r| r.root == handle.root) {
            info!("Adding root {}", handle.root.display());
            self.roots.push(RootConfig::load(handle.root.clone()));
        }
        self.active_root = Some(handle.root.clone());
        self.emit(EngineEvent::ProjectActivated {
            root: handle.root,
            name: handle.name,
        });

        self.initialize_context().await;
        self.run_pass().await;
    }

    // ─────────────────────────────────────────────────────────
    // Passes
    // ─────────────────────────────────────────────────────────

    /// One pass over every root's launch file, in root order
    async fn run_pass(&mut self) -> PassSummary {
        let context = self.tracker.snapshot().await;
        let mut summary = PassSummary::default();

        for root in &self.roots {
            let path = root.launch_path();
            let event = match apply_to_document(&self.store, &path, &context, &root.settings.format)
            {
                Ok(PassOutcome::Absent) => {
                    summary.absent += 1;
                    EngineEvent::LaunchFileAbsent {
                        root: root.root.clone(),
                        path,
                    }
                }
                Ok(PassOutcome::Unchanged { managed }) => {
                    summary.unchanged += 1;
                    EngineEvent::LaunchFileUnchanged {
                        root: root.root.clone(),
                        path,
                        managed,
                    }
                }
                Ok(PassOutcome::Updated { changes }) => {
                    summary.updated += 1;
                    EngineEvent::LaunchFileUpdated {
                        root: root.root.clone(),
                        path,
                        changes,
                    }
                }
                Err(e) => {
                    error!("Skipping {}: {}", path.display(), e);
                    summary.failed += 1;
                    EngineEvent::LaunchFileFailed {
                        root: root.root.clone(),
                        path,
                        error: e.to_string(),
                    }
                }
            };
            let _ = self.event_tx.send(event);
        }

        debug!("Pass finished: {:?}", summary);
        summary
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Forward integration events into the message channel
    fn spawn_integration_bridge(&self) {
        let mut events = self.integration.subscribe();
        let tx = self.msg_tx.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!("Integration event: {:?}", event);
                        if let Err(e) = forward(&tx, Message::from(event)).await {
                            debug!("Integration bridge stopping: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Missed {} integration event(s); re-reading presets", missed);
                        let message = Message::ConfigurationChanged(ContextKind::BuildPreset);
                        if let Err(e) = forward(&tx, message).await {
                            debug!("Integration bridge stopping: {}", e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

/// Queue `message` for the engine loop
async fn forward(tx: &mpsc::Sender<Message>, message: Message) -> Result<()> {
    tx.send(message)
        .await
        .map_err(|e| Error::channel_send(format!("engine loop is gone: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsync_cmake::test_utils::{FakeAnswer, FakeIntegration};
    use lsync_cmake::IntegrationEvent;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    const LAUNCH: &str = r#"{
    "version": "0.2.0",
    "configurations": [
        {
            "name": "debug only",
            "presentation": {
                "hidden": true,
                "cmake": [{ "type": "preset-include", "value": "debug" }]
            }
        },
        {
            "name": "gcc only",
            "presentation": {
                "cmake": [{ "type": "kit-match", "value": "^gcc" }]
            }
        }
    ]
}"#;

    fn project(launch: Option<&str>) -> TempDir {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "project(demo)").unwrap();
        if let Some(content) = launch {
            std::fs::create_dir_all(dir.path().join(".vscode")).unwrap();
            std::fs::write(dir.path().join(".vscode/launch.json"), content).unwrap();
        }
        dir
    }

    fn read_launch(dir: &TempDir) -> String {
        std::fs::read_to_string(dir.path().join(".vscode/launch.json")).unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_start_applies_initial_context() {
        let dir = project(Some(LAUNCH));
        let mut engine = Engine::new(
            FakeIntegration::with_build_preset("debug-linux"),
            vec![RootConfig::new(dir.path(), Settings::default())],
        );
        let mut rx = engine.subscribe();

        let summary = engine.start().await;
        assert_eq!(summary.updated, 1);

        let text = read_launch(&dir);
        assert!(text.contains("\"hidden\": false"));
        assert!(text.contains(
            "\"cmake\": [{ \"type\": \"kit-match\", \"value\": \"^gcc\" }],\n                \"hidden\": true"
        ));

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            EngineEvent::ContextChanged {
                context: BuildContext::with_preset("debug-linux")
            }
        );
        assert_eq!(events[1].event_type(), "launch_file_updated");
    }

    #[tokio::test]
    async fn test_second_pass_is_noop() {
        let dir = project(Some(LAUNCH));
        let mut engine = Engine::new(
            FakeIntegration::with_kit("gcc-13"),
            vec![RootConfig::new(dir.path(), Settings::default())],
        );

        engine.start().await;
        let first = read_launch(&dir);

        let summary = engine.refresh_all().await;
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(read_launch(&dir), first);
    }

    #[tokio::test]
    async fn test_configuration_change_refreshes_context() {
        let dir = project(Some(LAUNCH));
        let fake = Arc::new(FakeIntegration::with_build_preset("debug"));
        let mut engine = Engine::new(
            fake.clone(),
            vec![RootConfig::new(dir.path(), Settings::default())],
        );
        engine.start().await;

        fake.set(ContextKind::BuildPreset, FakeAnswer::none());
        fake.set(ContextKind::Kit, FakeAnswer::label("gcc-12"));
        assert!(
            engine
                .process_message(Message::ConfigurationChanged(ContextKind::Kit))
                .await
        );

        assert_eq!(engine.context().await, BuildContext::with_kit("gcc-12"));
        let value = lsync_core::jsonc::parse_value(&read_launch(&dir)).unwrap();
        assert_eq!(
            value["configurations"][0]["presentation"]["hidden"],
            serde_json::json!(true)
        );
        assert_eq!(
            value["configurations"][1]["presentation"]["hidden"],
            serde_json::json!(false)
        );
    }

    #[tokio::test]
    async fn test_failure_in_one_root_does_not_stop_others() {
        let broken = project(Some("{ \"configurations\": [ "));
        let missing = project(None);
        let good = project(Some(LAUNCH));
        let mut engine = Engine::new(
            FakeIntegration::with_build_preset("debug"),
            vec![
                RootConfig::new(broken.path(), Settings::default()),
                RootConfig::new(missing.path(), Settings::default()),
                RootConfig::new(good.path(), Settings::default()),
            ],
        );

        let summary = engine.start().await;
        assert_eq!(
            summary,
            PassSummary {
                updated: 1,
                unchanged: 0,
                absent: 1,
                failed: 1
            }
        );
        assert!(summary.has_failures());
        assert_eq!(
            std::fs::read_to_string(broken.path().join(".vscode/launch.json")).unwrap(),
            "{ \"configurations\": [ "
        );
    }

    #[tokio::test]
    async fn test_custom_launch_path() {
        let dir = project(None);
        std::fs::write(dir.path().join("launch.jsonc"), LAUNCH).unwrap();
        let mut settings = Settings::default();
        settings.launch.path = PathBuf::from("launch.jsonc");

        let mut engine = Engine::new(
            FakeIntegration::with_build_preset("debug"),
            vec![RootConfig::new(dir.path(), settings)],
        );
        assert_eq!(engine.start().await.updated, 1);
    }

    #[tokio::test]
    async fn test_active_project_change_adds_root() {
        let first = project(Some(LAUNCH));
        let second = project(Some(LAUNCH));
        let mut engine = Engine::new(
            FakeIntegration::with_build_preset("debug"),
            vec![RootConfig::new(first.path(), Settings::default())],
        );
        engine.start().await;

        engine
            .process_message(Message::ActiveProjectChanged(second.path().to_path_buf()))
            .await;

        assert_eq!(engine.roots().len(), 2);
        assert_eq!(engine.active_root(), Some(second.path()));
        assert!(read_launch(&second).contains("\"hidden\": false"));
    }

    #[tokio::test]
    async fn test_unknown_project_is_ignored() {
        let root = project(Some(LAUNCH));
        let stranger = tempdir().unwrap();
        let mut engine = Engine::new(
            FakeIntegration::new(),
            vec![RootConfig::new(root.path(), Settings::default())],
        );

        engine
            .process_message(Message::ActiveProjectChanged(stranger.path().to_path_buf()))
            .await;
        assert_eq!(engine.roots().len(), 1);
        assert_eq!(engine.active_root(), None);
    }

    #[tokio::test]
    async fn test_forward_to_stopped_loop_is_channel_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let err = forward(&tx, Message::RefreshRequested).await.unwrap_err();
        assert!(matches!(err, Error::ChannelSend { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_quit_stops_processing() {
        let mut engine = Engine::new(FakeIntegration::new(), Vec::new());
        assert!(!engine.process_message(Message::Quit).await);
    }

    async fn next_event(
        rx: &mut broadcast::Receiver<EngineEvent>,
        matches: impl Fn(&EngineEvent) -> bool,
    ) -> EngineEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = rx.recv().await.unwrap();
                if matches(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for engine event")
    }

    #[tokio::test]
    async fn test_run_reacts_to_integration_events() {
        let dir = project(Some(LAUNCH));
        let fake = Arc::new(FakeIntegration::with_build_preset("release"));
        let mut engine = Engine::new(
            fake.clone(),
            vec![RootConfig::new(dir.path(), Settings::default())],
        );
        let mut rx = engine.subscribe();
        let tx = engine.sender();

        let handle = tokio::spawn(async move { engine.run().await });

        // First pass only inserts the kit-only entry's flag
        next_event(&mut rx, |e| e.launch_path().is_some()).await;

        fake.set(ContextKind::BuildPreset, FakeAnswer::label("debug"));
        fake.emit(IntegrationEvent::ConfigurationChanged(ContextKind::BuildPreset));

        let context = next_event(&mut rx, |e| e.event_type() == "context_changed").await;
        assert_eq!(
            context,
            EngineEvent::ContextChanged {
                context: BuildContext::with_preset("debug")
            }
        );
        let updated = next_event(&mut rx, |e| e.launch_path().is_some()).await;
        assert_eq!(updated.event_type(), "launch_file_updated");

        tx.send(Message::Quit).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        next_event(&mut rx, |e| *e == EngineEvent::Shutdown).await;
        assert!(read_launch(&dir).contains("\"hidden\": false"));
    }
}
