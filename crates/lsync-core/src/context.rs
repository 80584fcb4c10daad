//! Build context: the currently selected CMake preset or kit

use serde::{Deserialize, Serialize};

/// Label CMake Tools reports when no build preset has been selected
pub const DEFAULT_BUILD_PRESET: &str = "__defaultBuildPreset__";

/// Label CMake Tools reports when no configure preset has been selected
pub const DEFAULT_CONFIGURE_PRESET: &str = "__defaultConfigurePreset__";

/// Which configuration axis changed in the build tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    ConfigurePreset,
    BuildPreset,
    Kit,
}

impl ContextKind {
    /// Both preset axes are folded together when refreshing
    pub fn is_preset(&self) -> bool {
        matches!(self, ContextKind::ConfigurePreset | ContextKind::BuildPreset)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContextKind::ConfigurePreset => "configure preset",
            ContextKind::BuildPreset => "build preset",
            ContextKind::Kit => "kit",
        }
    }
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The active build context.
///
/// At most one of `preset` and `kit` is set. The fields are private so the
/// constructors below are the only way to build a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildContext {
    preset: Option<String>,
    kit: Option<String>,
}

impl BuildContext {
    /// No preset and no kit selected
    pub fn none() -> Self {
        Self::default()
    }

    /// Context driven by a preset. Empty labels yield an empty context.
    pub fn with_preset(preset: impl Into<String>) -> Self {
        Self {
            preset: normalize_label(preset.into()),
            kit: None,
        }
    }

    /// Context driven by a kit. Empty labels yield an empty context.
    pub fn with_kit(kit: impl Into<String>) -> Self {
        Self {
            preset: None,
            kit: normalize_label(kit.into()),
        }
    }

    pub fn preset(&self) -> Option<&str> {
        self.preset.as_deref()
    }

    pub fn kit(&self) -> Option<&str> {
        self.kit.as_deref()
    }

    /// True when neither a preset nor a kit is selected
    pub fn is_empty(&self) -> bool {
        self.preset.is_none() && self.kit.is_none()
    }

    /// Subjects for unqualified matchers, preset first
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.preset().into_iter().chain(self.kit())
    }
}

impl std::fmt::Display for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.preset, &self.kit) {
            (Some(preset), _) => write!(f, "preset '{}'", preset),
            (None, Some(kit)) => write!(f, "kit '{}'", kit),
            (None, None) => f.write_str("no selection"),
        }
    }
}

/// Check whether a label is one of the "nothing selected" placeholders
pub fn is_placeholder(label: &str) -> bool {
    label == DEFAULT_BUILD_PRESET || label == DEFAULT_CONFIGURE_PRESET
}

/// Drop empty labels reported by the build tool; others are kept verbatim
pub fn normalize_label(label: String) -> Option<String> {
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}
