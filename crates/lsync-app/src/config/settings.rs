//! Settings parser for .lsync/config.toml

use super::types::Settings;
use lsync_core::prelude::*;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.toml";
pub const LSYNC_DIR: &str = ".lsync";

/// Environment variable naming a config file that replaces every root's own
pub const CONFIG_ENV_VAR: &str = "LSYNC_CONFIG";

/// Path of the settings file for `root`, honouring `LSYNC_CONFIG`
pub fn config_path(root: &Path) -> PathBuf {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => root.join(LSYNC_DIR).join(CONFIG_FILENAME),
    }
}

/// Load settings for `root`.
///
/// Never fails: a missing file gives defaults, an unreadable or invalid one
/// gives defaults plus a warning.
pub fn load_settings(root: &Path) -> Settings {
    let config_path = config_path(root);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create .lsync/ with a commented default config.toml
///
/// An existing config file is left alone.
pub fn init_config_dir(root: &Path) -> Result<()> {
    let lsync_dir = root.join(LSYNC_DIR);

    if !lsync_dir.exists() {
        std::fs::create_dir_all(&lsync_dir)
            .map_err(|e| Error::config(format!("Failed to create .lsync dir: {}", e)))?;
    }

    let config_path = lsync_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# launch-sync configuration

[launch]
path = ".vscode/launch.json"

[integration]
# Where the active preset/kit comes from: "state-file", "command" or "static"
source = "state-file"
query_timeout_ms = 2000

[integration.state_file]
path = ".lsync/state.json"
debounce_ms = 200

[integration.commands]
# argv commands printing the active label on stdout, e.g.
# build_preset = ["sh", "-c", "cat .lsync/build-preset"]
build_preset = []
configure_preset = []
kit = []

[format]
# Used when launch.json itself does not reveal its style
tab_size = 4
insert_spaces = true
eol = "auto"            # "auto", "lf" or "crlf"
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

/// Write `settings` to the file [`config_path`] names for `root`
///
/// Goes through a sibling temp file and a rename, so readers never see a
/// partial file.
pub fn save_settings(root: &Path, settings: &Settings) -> Result<()> {
    let config_path = config_path(root);
    let parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::config(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let file_name = config_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| CONFIG_FILENAME.to_string());
    let temp_path = parent.join(format!(".{}.tmp", file_name));

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("# launch-sync configuration\n\n{}", content);

    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}
