//! Runners behind `lsync sync` and `lsync watch`

use std::io::BufRead;
use std::path::PathBuf;

use tokio::sync::{broadcast, mpsc};

use lsync_app::{build_integration, ContextOverride, Engine, Message, PassSummary, RootConfig};
use lsync_core::prelude::*;
use lsync_core::ContextKind;

use super::Reporter;

/// Load every root's settings; the integration is configured by the first
fn load_roots(roots: Vec<PathBuf>) -> Result<Vec<RootConfig>> {
    if roots.is_empty() {
        return Err(Error::config("no workspace roots given"));
    }
    Ok(roots.into_iter().map(RootConfig::load).collect())
}

/// One pass with the current selection, then return the tallies
pub async fn run_sync(
    roots: Vec<PathBuf>,
    overrides: ContextOverride,
    reporter: Reporter,
) -> Result<PassSummary> {
    let configs = load_roots(roots)?;
    let first = &configs[0];
    let integration = build_integration(&first.root, &first.settings.integration, &overrides)?;
    info!("Syncing {} root(s) via {} integration", configs.len(), integration.name());

    let mut engine = Engine::new(integration, configs);
    let mut events = engine.subscribe();
    let summary = engine.start().await;

    loop {
        match events.try_recv() {
            Ok(event) => reporter.report(&event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                warn!("Dropped {} event(s) from output", missed);
            }
            Err(_) => break,
        }
    }
    reporter.report_summary(&summary);

    Ok(summary)
}

/// Follow selection changes until `q`, SIGINT or SIGTERM
pub async fn run_watch(roots: Vec<PathBuf>, reporter: Reporter) -> Result<()> {
    let configs = load_roots(roots)?;
    let first = &configs[0];
    let mut integration = build_integration(
        &first.root,
        &first.settings.integration,
        &ContextOverride::default(),
    )?;
    let source = integration.name();
    integration
        .start()
        .await
        .with_context(|| format!("Cannot start the {} integration", source))?;
    info!("Watching {} root(s) via {} integration", configs.len(), source);

    let mut engine = Engine::new(integration, configs);

    let mut events = engine.subscribe();
    let output = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    reporter.report(&event);
                    if event == lsync_app::EngineEvent::Shutdown {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Dropped {} event(s) from output", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let stdin_tx = engine.sender();
    std::thread::spawn(move || {
        forward_stdin_commands(std::io::stdin().lock(), stdin_tx);
    });

    let result = engine.run().await;

    // Dropping the engine stops the integration's watcher
    drop(engine);
    let _ = output.await;

    info!("launch-sync watch mode exiting");
    result
}

/// Message for one line typed on stdin
pub fn stdin_command(line: &str) -> Option<Message> {
    match line.trim() {
        "r" | "refresh" => Some(Message::RefreshRequested),
        "p" | "preset" => Some(Message::ConfigurationChanged(ContextKind::BuildPreset)),
        "k" | "kit" => Some(Message::ConfigurationChanged(ContextKind::Kit)),
        "q" | "quit" => Some(Message::Quit),
        "" => None,
        other => {
            warn!("Unknown stdin command: {}", other);
            None
        }
    }
}

/// Hand one stdin command to the engine (blocking)
fn send_command(msg_tx: &mpsc::Sender<Message>, message: Message) -> Result<()> {
    msg_tx
        .blocking_send(message)
        .map_err(|e| Error::channel_send(format!("stdin command dropped: {}", e)))
}

/// Read commands line by line until EOF or `quit` (blocking)
fn forward_stdin_commands<R: BufRead>(reader: R, msg_tx: mpsc::Sender<Message>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let Some(message) = stdin_command(&line) else {
            continue;
        };
        info!("Stdin: {:?}", message);
        let quit = message == Message::Quit;
        if let Err(e) = send_command(&msg_tx, message) {
            warn!("{}", e);
            break;
        }
        if quit {
            break;
        }
    }

    debug!("Stdin reader exiting");
}
