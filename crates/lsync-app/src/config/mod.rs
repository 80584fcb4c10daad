//! Configuration file parsing for launch-sync
//!
//! Supports:
//! - `.lsync/config.toml` - Per-root settings
//! - `LSYNC_CONFIG` - One config file shared by every root

pub mod settings;
pub mod types;

pub use settings::{
    config_path, init_config_dir, load_settings, save_settings, CONFIG_ENV_VAR, LSYNC_DIR,
};
pub use types::*;
