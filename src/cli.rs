//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lsync_app::ContextOverride;
use lsync_core::prelude::*;

/// launch-sync - keeps VS Code launch configurations in step with CMake
#[derive(Parser, Debug)]
#[command(name = "lsync", version)]
#[command(
    about = "Show or hide launch configurations for the active CMake preset or kit",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply the current selection once and exit
    Sync(SyncArgs),

    /// Follow selection changes until interrupted
    Watch(RootArgs),

    /// Write a commented default .lsync/config.toml
    Init {
        /// Workspace root (default: current directory)
        #[arg(value_name = "ROOT")]
        root: Option<PathBuf>,
    },
}

/// Arguments shared by `sync` and `watch`
#[derive(Args, Debug, Default)]
pub struct RootArgs {
    /// Workspace roots (default: current directory)
    #[arg(value_name = "ROOTS")]
    pub roots: Vec<PathBuf>,

    /// Print events as NDJSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub common: RootArgs,

    /// Use this build preset instead of asking the build tool
    #[arg(long, value_name = "PRESET", conflicts_with_all = ["configure_preset", "kit"])]
    pub preset: Option<String>,

    /// Use this configure preset instead of asking the build tool
    #[arg(long, value_name = "PRESET", conflicts_with = "kit")]
    pub configure_preset: Option<String>,

    /// Use this kit instead of asking the build tool
    #[arg(long, value_name = "KIT")]
    pub kit: Option<String>,
}

impl SyncArgs {
    pub fn overrides(&self) -> ContextOverride {
        ContextOverride {
            configure_preset: self.configure_preset.clone(),
            build_preset: self.preset.clone(),
            kit: self.kit.clone(),
        }
    }
}

/// Canonical, de-duplicated workspace roots.
///
/// No roots means the current directory. Every root must be an existing
/// directory.
pub fn resolve_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let requested = if roots.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        roots.to_vec()
    };

    let mut resolved = Vec::with_capacity(requested.len());
    for root in requested {
        let path = dunce::canonicalize(&root)
            .map_err(|e| Error::config(format!("Cannot use root {}: {}", root.display(), e)))?;
        if !path.is_dir() {
            return Err(Error::config(format!("{} is not a directory", path.display())));
        }
        if !resolved.contains(&path) {
            resolved.push(path);
        }
    }
    Ok(resolved)
}
