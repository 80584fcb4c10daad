//! Configuration types for launch-sync
//!
//! Defines:
//! - `Settings` - Per-root settings (`.lsync/config.toml`)
//! - Related sub-types and enums

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lsync_core::FormattingOptions;

/// Per-root settings (.lsync/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub launch: LaunchSettings,

    #[serde(default)]
    pub integration: IntegrationSettings,

    #[serde(default)]
    pub format: FormatSettings,
}

/// Where the launch file lives
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LaunchSettings {
    /// Path of launch.json, relative to the root
    #[serde(default = "default_launch_path")]
    pub path: PathBuf,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            path: default_launch_path(),
        }
    }
}

fn default_launch_path() -> PathBuf {
    PathBuf::from(".vscode").join("launch.json")
}

/// Which integration supplies the active selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationKind {
    /// JSON state file written by the editor host
    #[default]
    StateFile,
    /// External query commands
    Command,
    /// Labels given on the command line
    Static,
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationKind::StateFile => write!(f, "state-file"),
            IntegrationKind::Command => write!(f, "command"),
            IntegrationKind::Static => write!(f, "static"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IntegrationSettings {
    #[serde(default)]
    pub source: IntegrationKind,

    /// Upper bound for a single selection query
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    #[serde(default)]
    pub commands: CommandSettings,

    #[serde(default)]
    pub state_file: StateFileSettings,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            source: IntegrationKind::default(),
            query_timeout_ms: default_query_timeout_ms(),
            commands: CommandSettings::default(),
            state_file: StateFileSettings::default(),
        }
    }
}

impl IntegrationSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

fn default_query_timeout_ms() -> u64 {
    2000
}

/// Query commands (argv) per selection axis; empty means not queried
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandSettings {
    #[serde(default)]
    pub build_preset: Vec<String>,

    #[serde(default)]
    pub configure_preset: Vec<String>,

    #[serde(default)]
    pub kit: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StateFileSettings {
    /// Path of the state file, relative to the root
    #[serde(default = "default_state_path")]
    pub path: PathBuf,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for StateFileSettings {
    fn default() -> Self {
        Self {
            path: default_state_path(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from(".lsync").join("state.json")
}

fn default_debounce_ms() -> u64 {
    lsync_cmake::state_file::DEFAULT_DEBOUNCE_MS
}

/// Line ending for newly written text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EolStyle {
    /// Follow the file, `\n` when the file has no line breaks
    #[default]
    Auto,
    Lf,
    Crlf,
}

/// Whitespace used when a `hidden` property has to be inserted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FormatSettings {
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,

    #[serde(default = "default_true")]
    pub insert_spaces: bool,

    #[serde(default)]
    pub eol: EolStyle,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            tab_size: default_tab_size(),
            insert_spaces: true,
            eol: EolStyle::default(),
        }
    }
}

fn default_tab_size() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl FormatSettings {
    /// Options used when the file itself reveals nothing
    pub fn fallback(&self) -> FormattingOptions {
        let options = if self.insert_spaces {
            FormattingOptions::spaces(self.tab_size)
        } else {
            FormattingOptions::tabs()
        };
        match self.eol {
            EolStyle::Crlf => options.with_eol("\r\n"),
            EolStyle::Lf | EolStyle::Auto => options,
        }
    }

    /// Options for editing `text`: detected from the file, then the configured defaults
    pub fn for_text(&self, text: &str) -> FormattingOptions {
        let detected = FormattingOptions::detect(text, &self.fallback());
        match self.eol {
            EolStyle::Auto => detected,
            EolStyle::Lf => detected.with_eol("\n"),
            EolStyle::Crlf => detected.with_eol("\r\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.launch.path, PathBuf::from(".vscode/launch.json"));
        assert_eq!(settings.integration.source, IntegrationKind::StateFile);
        assert_eq!(settings.integration.query_timeout(), Duration::from_secs(2));
        assert_eq!(settings.integration.state_file.debounce_ms, 200);
        assert_eq!(settings.format.tab_size, 4);
        assert!(settings.format.insert_spaces);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[integration]
source = "command"

[integration.commands]
kit = ["cat", ".kit"]
"#,
        )
        .unwrap();

        assert_eq!(settings.integration.source, IntegrationKind::Command);
        assert_eq!(settings.integration.commands.kit, vec!["cat", ".kit"]);
        assert!(settings.integration.commands.build_preset.is_empty());
        assert_eq!(settings.integration.query_timeout_ms, 2000);
        assert_eq!(settings.launch, LaunchSettings::default());
    }

    #[test]
    fn test_integration_kind_names() {
        let settings: Settings = toml::from_str("[integration]\nsource = \"state-file\"").unwrap();
        assert_eq!(settings.integration.source, IntegrationKind::StateFile);
        assert_eq!(IntegrationKind::Static.to_string(), "static");
        assert!(toml::from_str::<Settings>("[integration]\nsource = \"vscode\"").is_err());
    }

    #[test]
    fn test_format_fallback() {
        let format = FormatSettings {
            tab_size: 2,
            insert_spaces: true,
            eol: EolStyle::Crlf,
        };
        assert_eq!(format.fallback(), FormattingOptions::spaces(2).with_eol("\r\n"));

        let format = FormatSettings {
            insert_spaces: false,
            ..FormatSettings::default()
        };
        assert_eq!(format.fallback(), FormattingOptions::tabs());
    }

    #[test]
    fn test_format_for_text_prefers_file() {
        let format = FormatSettings::default();
        let text = "{\r\n  \"configurations\": []\r\n}";
        assert_eq!(
            format.for_text(text),
            FormattingOptions::spaces(2).with_eol("\r\n")
        );
        assert_eq!(format.for_text("{}"), FormattingOptions::spaces(4));
    }

    #[test]
    fn test_format_forced_eol() {
        let format = FormatSettings {
            eol: EolStyle::Lf,
            ..FormatSettings::default()
        };
        let text = "{\r\n  \"configurations\": []\r\n}";
        assert_eq!(format.for_text(text).eol, "\n");
    }
}
