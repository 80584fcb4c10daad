//! Runtime choice between the concrete integrations

use std::path::Path;

use tokio::sync::broadcast;

use lsync_core::prelude::*;

use crate::command::CommandIntegration;
use crate::fixed::StaticIntegration;
use crate::integration::{BuildToolIntegration, IntegrationEvent, ProjectHandle};
use crate::state_file::StateFileIntegration;

/// Whichever integration the configuration selected
#[derive(Debug)]
pub enum IntegrationSource {
    Static(StaticIntegration),
    Command(CommandIntegration),
    StateFile(StateFileIntegration),
}

impl IntegrationSource {
    pub fn name(&self) -> &'static str {
        match self {
            IntegrationSource::Static(_) => "static",
            IntegrationSource::Command(_) => "command",
            IntegrationSource::StateFile(_) => "state-file",
        }
    }

    /// Start background notification sources, if the integration has any
    pub async fn start(&mut self) -> Result<()> {
        match self {
            IntegrationSource::StateFile(source) => source.watch().await,
            IntegrationSource::Static(_) | IntegrationSource::Command(_) => Ok(()),
        }
    }

    /// Stop background notification sources
    pub fn stop(&mut self) {
        if let IntegrationSource::StateFile(source) = self {
            source.stop();
        }
    }
}

impl BuildToolIntegration for IntegrationSource {
    async fn active_build_preset(&self) -> Result<Option<String>> {
        match self {
            IntegrationSource::Static(s) => s.active_build_preset().await,
            IntegrationSource::Command(s) => s.active_build_preset().await,
            IntegrationSource::StateFile(s) => s.active_build_preset().await,
        }
    }

    async fn active_configure_preset(&self) -> Result<Option<String>> {
        match self {
            IntegrationSource::Static(s) => s.active_configure_preset().await,
            IntegrationSource::Command(s) => s.active_configure_preset().await,
            IntegrationSource::StateFile(s) => s.active_configure_preset().await,
        }
    }

    async fn active_kit(&self) -> Result<Option<String>> {
        match self {
            IntegrationSource::Static(s) => s.active_kit().await,
            IntegrationSource::Command(s) => s.active_kit().await,
            IntegrationSource::StateFile(s) => s.active_kit().await,
        }
    }

    async fn project(&self, root: &Path) -> Result<Option<ProjectHandle>> {
        match self {
            IntegrationSource::Static(s) => s.project(root).await,
            IntegrationSource::Command(s) => s.project(root).await,
            IntegrationSource::StateFile(s) => s.project(root).await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        match self {
            IntegrationSource::Static(s) => s.subscribe(),
            IntegrationSource::Command(s) => s.subscribe(),
            IntegrationSource::StateFile(s) => s.subscribe(),
        }
    }
}
