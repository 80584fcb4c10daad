//! Headless output - engine events as JSON or plain text
//!
//! With `--json`, every engine event is written to stdout as one line of
//! NDJSON with an "event" field naming its type. Otherwise a short human
//! readable line goes to stderr for the events worth seeing.
//!
//! # Example Output
//!
//! ```json
//! {"event":"context_changed","preset":"debug","kit":null,"timestamp":1704700001000}
//! {"event":"launch_file_updated","path":"/w/.vscode/launch.json","changes":[{"index":0,"hidden":false,"previous":true}],"timestamp":1704700001004}
//! {"event":"launch_file_unchanged","path":"/w2/.vscode/launch.json","managed":3,"timestamp":1704700001005}
//! ```

pub mod runner;

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use lsync_app::{EngineEvent, PassSummary};
use lsync_core::VisibilityChange;

/// Events emitted in JSON mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// A new build context was committed
    ContextChanged {
        preset: Option<String>,
        kit: Option<String>,
        timestamp: i64,
    },

    /// The build tool switched projects
    ProjectActivated {
        root: PathBuf,
        name: String,
        timestamp: i64,
    },

    /// No launch file under a root
    LaunchFileAbsent { path: PathBuf, timestamp: i64 },

    /// Launch file already in step
    LaunchFileUnchanged {
        path: PathBuf,
        managed: usize,
        timestamp: i64,
    },

    /// Launch file rewritten
    LaunchFileUpdated {
        path: PathBuf,
        changes: Vec<VisibilityChange>,
        timestamp: i64,
    },

    /// Launch file skipped after an error
    LaunchFileFailed {
        path: PathBuf,
        error: String,
        timestamp: i64,
    },

    /// Totals of a one-shot sync
    Summary {
        updated: usize,
        unchanged: usize,
        absent: usize,
        failed: usize,
        timestamp: i64,
    },

    /// Error outside a launch file pass
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    /// The engine stopped
    Shutdown { timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }

    pub fn summary(summary: &PassSummary) -> Self {
        Self::Summary {
            updated: summary.updated,
            unchanged: summary.unchanged,
            absent: summary.absent,
            failed: summary.failed,
            timestamp: Self::now(),
        }
    }
}

impl From<&EngineEvent> for HeadlessEvent {
    fn from(event: &EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::ContextChanged { context } => Self::ContextChanged {
                preset: context.preset().map(str::to_string),
                kit: context.kit().map(str::to_string),
                timestamp,
            },
            EngineEvent::ProjectActivated { root, name } => Self::ProjectActivated {
                root: root.clone(),
                name: name.clone(),
                timestamp,
            },
            EngineEvent::LaunchFileAbsent { path, .. } => Self::LaunchFileAbsent {
                path: path.clone(),
                timestamp,
            },
            EngineEvent::LaunchFileUnchanged { path, managed, .. } => Self::LaunchFileUnchanged {
                path: path.clone(),
                managed: *managed,
                timestamp,
            },
            EngineEvent::LaunchFileUpdated { path, changes, .. } => Self::LaunchFileUpdated {
                path: path.clone(),
                changes: changes.clone(),
                timestamp,
            },
            EngineEvent::LaunchFileFailed { path, error, .. } => Self::LaunchFileFailed {
                path: path.clone(),
                error: error.clone(),
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }
}

/// Writes engine events in the selected output mode
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    json: bool,
}

impl Reporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn report(&self, event: &EngineEvent) {
        if self.json {
            HeadlessEvent::from(event).emit();
        } else if let Some(line) = describe(event) {
            eprintln!("{}", line);
        }
    }

    pub fn report_summary(&self, summary: &PassSummary) {
        if self.json {
            HeadlessEvent::summary(summary).emit();
        } else {
            eprintln!(
                "{} updated, {} unchanged, {} without launch file, {} failed",
                summary.updated, summary.unchanged, summary.absent, summary.failed
            );
        }
    }

    pub fn report_error(&self, message: &str, fatal: bool) {
        if self.json {
            HeadlessEvent::error(message.to_string(), fatal).emit();
        } else {
            eprintln!("lsync: {}", message);
        }
    }
}

/// Human readable line for `event`; `None` for events not worth printing
pub fn describe(event: &EngineEvent) -> Option<String> {
    match event {
        EngineEvent::ContextChanged { context } => Some(format!("Active selection: {}", context)),
        EngineEvent::ProjectActivated { root, name } => {
            Some(format!("Active project: {} ({})", name, root.display()))
        }
        EngineEvent::LaunchFileAbsent { .. } => None,
        EngineEvent::LaunchFileUnchanged { path, managed, .. } => Some(format!(
            "{}: up to date ({} managed)",
            path.display(),
            managed
        )),
        EngineEvent::LaunchFileUpdated { path, changes, .. } => {
            let shown = changes.iter().filter(|c| !c.hidden).count();
            Some(format!(
                "{}: {} shown, {} hidden",
                path.display(),
                shown,
                changes.len() - shown
            ))
        }
        EngineEvent::LaunchFileFailed { path, error, .. } => {
            Some(format!("{}: skipped: {}", path.display(), error))
        }
        EngineEvent::Shutdown => None,
    }
}
