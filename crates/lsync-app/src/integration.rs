//! Building the configured integration for a set of roots

use std::path::Path;

use lsync_cmake::{CommandIntegration, IntegrationSource, StateFileIntegration, StaticIntegration};
use lsync_core::prelude::*;
use lsync_core::ContextKind;

use crate::config::{IntegrationKind, IntegrationSettings};

/// Labels given on the command line; any of them forces the static source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverride {
    pub configure_preset: Option<String>,
    pub build_preset: Option<String>,
    pub kit: Option<String>,
}

impl ContextOverride {
    pub fn is_empty(&self) -> bool {
        self.configure_preset.is_none() && self.build_preset.is_none() && self.kit.is_none()
    }

    fn to_integration(&self) -> StaticIntegration {
        let mut integration = StaticIntegration::new();
        if let Some(preset) = &self.configure_preset {
            integration = integration.with_configure_preset(preset.clone());
        }
        if let Some(preset) = &self.build_preset {
            integration = integration.with_build_preset(preset.clone());
        }
        if let Some(kit) = &self.kit {
            integration = integration.with_kit(kit.clone());
        }
        integration
    }
}

/// Create the integration `settings` ask for, rooted at `root`.
///
/// Relative paths and query commands resolve against `root`. A command
/// source without any command, or with a program missing from `PATH`, is
/// `Error::IntegrationUnavailable`.
pub fn build_integration(
    root: &Path,
    settings: &IntegrationSettings,
    overrides: &ContextOverride,
) -> Result<IntegrationSource> {
    if !overrides.is_empty() {
        debug!("Using labels from the command line");
        return Ok(IntegrationSource::Static(overrides.to_integration()));
    }

    let source = match settings.source {
        IntegrationKind::Static => IntegrationSource::Static(StaticIntegration::new()),
        IntegrationKind::StateFile => IntegrationSource::StateFile(
            StateFileIntegration::new(root.join(&settings.state_file.path))
                .with_debounce_ms(settings.state_file.debounce_ms),
        ),
        IntegrationKind::Command => {
            let commands = &settings.commands;
            let integration = CommandIntegration::new(root)
                .with_command(ContextKind::BuildPreset, &commands.build_preset)?
                .with_command(ContextKind::ConfigurePreset, &commands.configure_preset)?
                .with_command(ContextKind::Kit, &commands.kit)?;
            if !integration.has_commands() {
                return Err(Error::integration_unavailable(
                    "source is \"command\" but no query commands are configured",
                ));
            }
            IntegrationSource::Command(integration)
        }
    };

    info!("Using {} integration", source.name());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsync_cmake::BuildToolIntegration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_overrides_force_static_source() {
        let overrides = ContextOverride {
            build_preset: Some("debug".to_string()),
            ..Default::default()
        };
        let source =
            build_integration(Path::new("/w"), &IntegrationSettings::default(), &overrides)
                .unwrap();

        assert_eq!(source.name(), "static");
        assert_eq!(
            source.active_build_preset().await.unwrap(),
            Some("debug".to_string())
        );
    }

    #[test]
    fn test_default_is_state_file_under_root() {
        let dir = tempdir().unwrap();
        let source = build_integration(
            dir.path(),
            &IntegrationSettings::default(),
            &ContextOverride::default(),
        )
        .unwrap();

        match source {
            IntegrationSource::StateFile(s) => {
                assert_eq!(s.path(), dir.path().join(".lsync/state.json"))
            }
            other => panic!("unexpected source {}", other.name()),
        }
    }

    #[test]
    fn test_command_source_without_commands_is_unavailable() {
        let settings = IntegrationSettings {
            source: IntegrationKind::Command,
            ..Default::default()
        };
        let err = build_integration(Path::new("/w"), &settings, &ContextOverride::default())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_source_runs_in_root() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("kit.txt"), "gcc-12\n").unwrap();
        let mut settings = IntegrationSettings {
            source: IntegrationKind::Command,
            ..Default::default()
        };
        settings.commands.kit = vec!["cat".to_string(), "kit.txt".to_string()];

        let source =
            build_integration(dir.path(), &settings, &ContextOverride::default()).unwrap();
        assert_eq!(source.active_kit().await.unwrap(), Some("gcc-12".to_string()));
    }
}
