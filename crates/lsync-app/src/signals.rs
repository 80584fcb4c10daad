//! Stop the engine on SIGINT/SIGTERM (Ctrl+C on Windows)

use tokio::sync::mpsc;

use crate::message::Message;
use lsync_core::prelude::*;

/// Spawn a task that turns the first termination signal into `Message::Quit`
pub fn spawn_signal_handler(tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => info!("{} received, stopping", name),
            Err(e) => {
                error!("Cannot listen for termination signals: {}", e);
                return;
            }
        }

        if let Err(e) = request_quit(&tx).await {
            debug!("{}", e);
        }
    });
}

async fn request_quit(tx: &mpsc::Sender<Message>) -> Result<()> {
    tx.send(Message::Quit)
        .await
        .map_err(|e| Error::channel_send(format!("quit after signal: {}", e)))
}

/// Name of the signal that arrived
async fn wait_for_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        Ok(name)
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }
}
