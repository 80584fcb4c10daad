//! Domain events emitted by the Engine for external consumers
//!
//! Events are broadcast while a message is processed, in the order the work
//! happens: the new context first, then one event per launch file.

use std::path::PathBuf;

use lsync_core::{BuildContext, VisibilityChange};

/// Domain events emitted by the Engine.
///
/// Subscribers obtain a receiver via `Engine::subscribe()`. The CLI turns
/// them into NDJSON lines or a human summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Context
    // ─────────────────────────────────────────────────────────
    /// The tracker committed a new context
    ContextChanged { context: BuildContext },

    /// A project became the active one
    ProjectActivated { root: PathBuf, name: String },

    // ─────────────────────────────────────────────────────────
    // Launch File Passes
    // ─────────────────────────────────────────────────────────
    /// The root has no launch file
    LaunchFileAbsent { root: PathBuf, path: PathBuf },

    /// The launch file already matched the context
    LaunchFileUnchanged {
        root: PathBuf,
        path: PathBuf,
        managed: usize,
    },

    /// The launch file was rewritten
    LaunchFileUpdated {
        root: PathBuf,
        path: PathBuf,
        changes: Vec<VisibilityChange>,
    },

    /// The pass over the launch file failed; the file was not written
    LaunchFileFailed {
        root: PathBuf,
        path: PathBuf,
        error: String,
    },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    /// The engine loop is exiting
    Shutdown,
}

impl EngineEvent {
    /// Stable snake_case label for the event
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ContextChanged { .. } => "context_changed",
            Self::ProjectActivated { .. } => "project_activated",
            Self::LaunchFileAbsent { .. } => "launch_file_absent",
            Self::LaunchFileUnchanged { .. } => "launch_file_unchanged",
            Self::LaunchFileUpdated { .. } => "launch_file_updated",
            Self::LaunchFileFailed { .. } => "launch_file_failed",
            Self::Shutdown => "shutdown",
        }
    }

    /// Launch file the event is about, if any
    pub fn launch_path(&self) -> Option<&PathBuf> {
        match self {
            Self::LaunchFileAbsent { path, .. }
            | Self::LaunchFileUnchanged { path, .. }
            | Self::LaunchFileUpdated { path, .. }
            | Self::LaunchFileFailed { path, .. } => Some(path),
            Self::ContextChanged { .. } | Self::ProjectActivated { .. } | Self::Shutdown => None,
        }
    }
}
