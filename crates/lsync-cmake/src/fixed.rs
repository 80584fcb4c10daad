//! Integration with labels fixed at construction (CLI overrides)

use std::path::Path;

use tokio::sync::broadcast;

use lsync_core::prelude::*;

use crate::integration::{
    detect_project, event_channel, publish, BuildToolIntegration, IntegrationEvent, ProjectHandle,
};

/// Answers every query with a fixed label
#[derive(Debug)]
pub struct StaticIntegration {
    build_preset: Option<String>,
    configure_preset: Option<String>,
    kit: Option<String>,
    events: broadcast::Sender<IntegrationEvent>,
}

impl Default for StaticIntegration {
    fn default() -> Self {
        Self {
            build_preset: None,
            configure_preset: None,
            kit: None,
            events: event_channel(),
        }
    }
}

impl StaticIntegration {
    /// An integration with nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_build_preset(mut self, preset: impl Into<String>) -> Self {
        self.build_preset = Some(preset.into());
        self
    }

    pub fn with_configure_preset(mut self, preset: impl Into<String>) -> Self {
        self.configure_preset = Some(preset.into());
        self
    }

    pub fn with_kit(mut self, kit: impl Into<String>) -> Self {
        self.kit = Some(kit.into());
        self
    }

    /// Broadcast an event to subscribers
    pub fn emit(&self, event: IntegrationEvent) {
        publish(&self.events, event);
    }
}

impl BuildToolIntegration for StaticIntegration {
    async fn active_build_preset(&self) -> Result<Option<String>> {
        Ok(self.build_preset.clone())
    }

    async fn active_configure_preset(&self) -> Result<Option<String>> {
        Ok(self.configure_preset.clone())
    }

    async fn active_kit(&self) -> Result<Option<String>> {
        Ok(self.kit.clone())
    }

    async fn project(&self, root: &Path) -> Result<Option<ProjectHandle>> {
        Ok(detect_project(root))
    }

    fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsync_core::ContextKind;

    #[tokio::test]
    async fn test_fixed_answers() {
        let integration = StaticIntegration::new()
            .with_build_preset("debug")
            .with_kit("gcc");

        assert_eq!(
            integration.active_build_preset().await.unwrap(),
            Some("debug".to_string())
        );
        assert_eq!(integration.active_configure_preset().await.unwrap(), None);
        assert_eq!(integration.active_kit().await.unwrap(), Some("gcc".to_string()));
    }

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let integration = StaticIntegration::new();
        let mut rx = integration.subscribe();

        integration.emit(IntegrationEvent::ConfigurationChanged(ContextKind::BuildPreset));
        assert_eq!(
            rx.recv().await.unwrap(),
            IntegrationEvent::ConfigurationChanged(ContextKind::BuildPreset)
        );
    }
}
