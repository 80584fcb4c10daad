//! Integration backed by external query commands
//!
//! Each axis (build preset, configure preset, kit) may be bound to an argv
//! command. The command's trimmed stdout is the active label; a non-zero exit
//! is a query failure. Programs are resolved on `PATH` up front so a missing
//! tool is reported once at startup instead of on every query.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::broadcast;

use lsync_core::prelude::*;
use lsync_core::ContextKind;

use crate::integration::{
    detect_project, event_channel, publish, BuildToolIntegration, IntegrationEvent, ProjectHandle,
};

/// A resolved argv command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl QueryCommand {
    /// Resolve `argv[0]` with `which`
    pub fn resolve(argv: &[String]) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::config("query command must not be empty"));
        };

        let resolved = which::which(program).map_err(|e| {
            Error::integration_unavailable(format!("'{}' not found: {}", program, e))
        })?;
        debug!("Resolved query program '{}' to {}", program, resolved.display());

        Ok(Self {
            program: resolved,
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command in `cwd` and return its trimmed stdout
    pub async fn run(&self, query: &str, cwd: &Path) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out query drops this future; the child must not linger.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::query(query, format!("failed to spawn: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::query(
                query,
                format!("exited with code {:?}: {}", output.status.code(), stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!("{} -> {:?}", query, stdout);
        Ok(lsync_core::normalize_label(stdout.trim().to_string()))
    }
}

/// Queries the active selection by running commands
#[derive(Debug)]
pub struct CommandIntegration {
    cwd: PathBuf,
    build_preset: Option<QueryCommand>,
    configure_preset: Option<QueryCommand>,
    kit: Option<QueryCommand>,
    events: broadcast::Sender<IntegrationEvent>,
}

impl CommandIntegration {
    /// Commands run in `cwd`; axes without a command report nothing
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            build_preset: None,
            configure_preset: None,
            kit: None,
            events: event_channel(),
        }
    }

    /// Bind `kind` to `argv`; an empty argv leaves the axis unbound
    pub fn with_command(mut self, kind: ContextKind, argv: &[String]) -> Result<Self> {
        if argv.is_empty() {
            return Ok(self);
        }
        let command = Some(QueryCommand::resolve(argv)?);
        match kind {
            ContextKind::BuildPreset => self.build_preset = command,
            ContextKind::ConfigurePreset => self.configure_preset = command,
            ContextKind::Kit => self.kit = command,
        }
        Ok(self)
    }

    /// Whether any axis has a command
    pub fn has_commands(&self) -> bool {
        self.build_preset.is_some() || self.configure_preset.is_some() || self.kit.is_some()
    }

    /// Broadcast an event to subscribers
    pub fn emit(&self, event: IntegrationEvent) {
        publish(&self.events, event);
    }

    async fn query(&self, command: Option<&QueryCommand>, query: &str) -> Result<Option<String>> {
        match command {
            Some(command) => command.run(query, &self.cwd).await,
            None => Ok(None),
        }
    }
}

impl BuildToolIntegration for CommandIntegration {
    async fn active_build_preset(&self) -> Result<Option<String>> {
        self.query(self.build_preset.as_ref(), "activeBuildPreset").await
    }

    async fn active_configure_preset(&self) -> Result<Option<String>> {
        self.query(self.configure_preset.as_ref(), "activeConfigurePreset")
            .await
    }

    async fn active_kit(&self) -> Result<Option<String>> {
        self.query(self.kit.as_ref(), "activeKit").await
    }

    async fn project(&self, root: &Path) -> Result<Option<ProjectHandle>> {
        Ok(detect_project(root))
    }

    fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.events.subscribe()
    }
}
