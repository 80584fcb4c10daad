//! Test utilities for integration consumers
//!
//! Provides [`FakeIntegration`], a scripted [`BuildToolIntegration`] whose
//! answers, failures and delays are set per axis.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;

use lsync_core::prelude::*;
use lsync_core::ContextKind;

use crate::integration::{
    detect_project, event_channel, publish, BuildToolIntegration, IntegrationEvent, ProjectHandle,
};

/// One scripted reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeAnswer {
    result: std::result::Result<Option<String>, String>,
    delay: Duration,
}

impl FakeAnswer {
    /// Reply with `label`
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            result: Ok(Some(label.into())),
            delay: Duration::ZERO,
        }
    }

    /// Reply with nothing selected
    pub fn none() -> Self {
        Self {
            result: Ok(None),
            delay: Duration::ZERO,
        }
    }

    /// Fail the query with `message`
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            delay: Duration::ZERO,
        }
    }

    /// Reply only after `delay`
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
struct Axis {
    queued: VecDeque<FakeAnswer>,
    current: FakeAnswer,
    calls: usize,
}

impl Default for Axis {
    fn default() -> Self {
        Self {
            queued: VecDeque::new(),
            current: FakeAnswer::none(),
            calls: 0,
        }
    }
}

/// Scripted integration for tests
///
/// Each axis answers from its queue first, then with its current answer.
#[derive(Debug)]
pub struct FakeIntegration {
    axes: Mutex<HashMap<ContextKind, Axis>>,
    projects: Mutex<Vec<PathBuf>>,
    events: broadcast::Sender<IntegrationEvent>,
}

impl Default for FakeIntegration {
    fn default() -> Self {
        Self {
            axes: Mutex::new(HashMap::new()),
            projects: Mutex::new(Vec::new()),
            events: event_channel(),
        }
    }
}

impl FakeIntegration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integration answering `preset` as the active build preset
    pub fn with_build_preset(preset: &str) -> Self {
        let fake = Self::new();
        fake.set(ContextKind::BuildPreset, FakeAnswer::label(preset));
        fake
    }

    /// Integration answering `kit` as the active kit
    pub fn with_kit(kit: &str) -> Self {
        let fake = Self::new();
        fake.set(ContextKind::Kit, FakeAnswer::label(kit));
        fake
    }

    /// Replace the standing answer for `kind`
    pub fn set(&self, kind: ContextKind, answer: FakeAnswer) {
        self.lock_axes().entry(kind).or_default().current = answer;
    }

    /// Queue a one-shot answer for the next query of `kind`
    pub fn push(&self, kind: ContextKind, answer: FakeAnswer) {
        self.lock_axes().entry(kind).or_default().queued.push_back(answer);
    }

    /// Number of queries made for `kind`
    pub fn calls(&self, kind: ContextKind) -> usize {
        self.lock_axes().get(&kind).map_or(0, |a| a.calls)
    }

    /// Report `root` as a project even without CMake markers
    pub fn add_project(&self, root: impl Into<PathBuf>) {
        self.projects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(root.into());
    }

    /// Broadcast an event to subscribers
    pub fn emit(&self, event: IntegrationEvent) {
        publish(&self.events, event);
    }

    fn lock_axes(&self) -> MutexGuard<'_, HashMap<ContextKind, Axis>> {
        self.axes.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn answer(&self, kind: ContextKind) -> Result<Option<String>> {
        let answer = {
            let mut axes = self.lock_axes();
            let axis = axes.entry(kind).or_default();
            axis.calls += 1;
            axis.queued.pop_front().unwrap_or_else(|| axis.current.clone())
        };

        if !answer.delay.is_zero() {
            tokio::time::sleep(answer.delay).await;
        }
        answer
            .result
            .map_err(|message| Error::query(kind.label(), message))
    }
}

impl BuildToolIntegration for FakeIntegration {
    async fn active_build_preset(&self) -> Result<Option<String>> {
        self.answer(ContextKind::BuildPreset).await
    }

    async fn active_configure_preset(&self) -> Result<Option<String>> {
        self.answer(ContextKind::ConfigurePreset).await
    }

    async fn active_kit(&self) -> Result<Option<String>> {
        self.answer(ContextKind::Kit).await
    }

    async fn project(&self, root: &Path) -> Result<Option<ProjectHandle>> {
        let known = self
            .projects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|p| p == root);
        if known {
            return Ok(Some(ProjectHandle::new(root)));
        }
        Ok(detect_project(root))
    }

    fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_standing_answer() {
        let fake = FakeIntegration::with_kit("gcc");
        fake.push(ContextKind::Kit, FakeAnswer::fail("busy"));

        assert!(fake.active_kit().await.is_err());
        assert_eq!(fake.active_kit().await.unwrap(), Some("gcc".to_string()));
        assert_eq!(fake.calls(ContextKind::Kit), 2);
        assert_eq!(fake.calls(ContextKind::BuildPreset), 0);
    }

    #[tokio::test]
    async fn test_delayed_answer() {
        let fake = FakeIntegration::new();
        fake.set(
            ContextKind::BuildPreset,
            FakeAnswer::label("debug").after(Duration::from_millis(20)),
        );

        let started = std::time::Instant::now();
        assert_eq!(
            fake.active_build_preset().await.unwrap(),
            Some("debug".to_string())
        );
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_known_projects() {
        let fake = FakeIntegration::new();
        fake.add_project("/w/app");

        assert!(fake.project(Path::new("/w/app")).await.unwrap().is_some());
        assert!(fake.project(Path::new("/w/none")).await.unwrap().is_none());
    }
}
