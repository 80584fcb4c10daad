//! launch-sync command-line support
//!
//! Argument parsing and the `sync`/`watch` runners used by the `lsync`
//! binary. The engine itself lives in `lsync-app`.

pub mod cli;
pub mod headless;

pub use headless::runner::{run_sync, run_watch};
pub use headless::Reporter;
