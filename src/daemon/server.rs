//! Daemon run loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::config::NativeTimerConfig;
use crate::live_status::LiveStatusBoard;
use crate::notification::PlatformNotificationCenter;

use super::ipc::{IpcServer, RequestHandler};
use super::manager::{TimerEvent, TimerSessionManager};
use super::signals::RemoteSignalBus;

/// Runs the daemon until Ctrl-C.
///
/// Binds the IPC socket, wires the session manager to the in-process
/// live-status board and the platform notification center, and serves
/// each connection on its own task.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or accepting fails.
pub async fn run(config: NativeTimerConfig) -> Result<()> {
    let socket_path = config.resolve_socket_path()?;
    let server = IpcServer::new(&socket_path)?;

    let bus = RemoteSignalBus::new();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let live_status = Arc::new(LiveStatusBoard::new(config.live_status_enabled));
    let notifications = Arc::new(PlatformNotificationCenter::new());

    let manager = TimerSessionManager::new(notifications, live_status, config)
        .with_event_sender(event_tx)
        .listen(bus.subscribe());
    let handler = RequestHandler::new(Arc::clone(&manager)).with_signal_bus(bus);

    let logger = tokio::spawn(log_events(event_rx));

    tracing::info!(socket = ?server.socket_path(), "Daemon listening");

    loop {
        tokio::select! {
            accepted = server.accept() => {
                let stream = accepted.context("IPC accept loop failed")?;
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Err(e) = handler.serve(stream).await {
                        tracing::warn!(error = %e, "IPC connection failed");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    manager.shutdown().await;
    logger.abort();
    Ok(())
}

async fn log_events(mut events: mpsc::UnboundedReceiver<TimerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            TimerEvent::Tick { formatted, .. } => tracing::debug!(%formatted, "tick"),
            TimerEvent::RemoteSignalHandled { signal } => {
                tracing::info!(signal = signal.as_str(), "Remote signal handled")
            }
            other => tracing::info!(event = ?other, "Timer event"),
        }
    }
}
