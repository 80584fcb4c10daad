//! launch-sync - keeps VS Code launch configurations in step with CMake
//!
//! This is the binary entry point. All logic lives in the library.

use clap::Parser;
use launch_sync::cli::{resolve_roots, Cli, Command};
use launch_sync::{run_sync, run_watch, Reporter};
use lsync_app::config::{init_config_dir, LSYNC_DIR};
use lsync_core::Error;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Logging is optional: keep going without a log file
    if let Err(e) = lsync_core::logging::init() {
        eprintln!("lsync: logging disabled: {}", e);
    }

    match cli.command {
        Command::Init { root } => {
            for root in resolve_roots(root.as_slice())? {
                init_config_dir(&root)?;
                eprintln!("Initialized {}", root.join(LSYNC_DIR).display());
            }
        }
        Command::Sync(args) => {
            let reporter = Reporter::new(args.common.json);
            let roots = resolve_roots(&args.common.roots)?;
            match run_sync(roots, args.overrides(), reporter).await {
                Ok(summary) if summary.has_failures() => std::process::exit(1),
                Ok(_) => {}
                Err(e) => exit_with(reporter, e),
            }
        }
        Command::Watch(args) => {
            let reporter = Reporter::new(args.json);
            let roots = resolve_roots(&args.roots)?;
            if let Err(e) = run_watch(roots, reporter).await {
                exit_with(reporter, e);
            }
        }
    }

    Ok(())
}

/// Report a startup failure in the selected output mode and exit with 1
fn exit_with(reporter: Reporter, error: Error) -> ! {
    if error.is_fatal() {
        tracing::warn!("{}", error);
    } else {
        tracing::error!("{}", error);
    }
    reporter.report_error(&error.to_string(), error.is_fatal());
    std::process::exit(1)
}
