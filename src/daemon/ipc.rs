//! IPC bridge for the native timer daemon.
//!
//! This module provides the Unix Domain Socket request/response layer:
//! - Server that listens on a Unix socket
//! - One JSON request and one JSON response per connection
//! - Dispatch of every request to the [`TimerSessionManager`]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};

use crate::live_status::LiveStatusProvider;
use crate::notification::NotificationCenter;
use crate::types::{IpcRequest, IpcResponse, PublicationId, RemoteSignal, ResponseData};

use super::error::TimerError;
use super::manager::TimerSessionManager;
use super::signals::RemoteSignalBus;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
pub const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Message sent back for requests that fail to deserialize.
pub const INVALID_REQUEST_MESSAGE: &str = "Missing required parameters";

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// The client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// The payload is not a valid request
    #[error("{INVALID_REQUEST_MESSAGE}: {0}")]
    InvalidRequest(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        tracing::debug!(socket = ?socket_path, "IPC server bound");

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::InvalidRequest`] if the payload does not
    /// deserialize, or another [`IpcError`] if reading fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest, IpcError> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE + 1];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string())),
            Err(_) => return Err(IpcError::Timeout),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed);
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge);
        }

        serde_json::from_slice(&buffer[..n]).map_err(|e| IpcError::InvalidRequest(e.to_string()))
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the session manager.
pub struct RequestHandler<N, L> {
    manager: Arc<TimerSessionManager<N, L>>,
    /// Bus that `signal` requests are published on, if the manager listens
    /// to one
    signals: Option<RemoteSignalBus>,
}

impl<N, L> Clone for RequestHandler<N, L> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            signals: self.signals.clone(),
        }
    }
}

impl<N, L> RequestHandler<N, L>
where
    N: NotificationCenter,
    L: LiveStatusProvider,
{
    /// Creates a handler that applies signals to the manager directly.
    pub fn new(manager: Arc<TimerSessionManager<N, L>>) -> Self {
        Self {
            manager,
            signals: None,
        }
    }

    /// Publishes `signal` requests on `bus` instead of applying them
    /// directly.
    #[must_use]
    pub fn with_signal_bus(mut self, bus: RemoteSignalBus) -> Self {
        self.signals = Some(bus);
        self
    }

    /// Serves a single connection: one request, one response.
    ///
    /// Malformed requests are answered with an error response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be read or the response
    /// cannot be written.
    pub async fn serve(&self, mut stream: UnixStream) -> Result<()> {
        let response = match IpcServer::receive_request(&mut stream).await {
            Ok(request) => {
                tracing::debug!(command = request.command(), "IPC request received");
                self.handle(request).await
            }
            Err(IpcError::InvalidRequest(detail)) => {
                tracing::warn!(%detail, "Rejected malformed IPC request");
                IpcResponse::error(INVALID_REQUEST_MESSAGE)
            }
            Err(IpcError::RequestTooLarge) => {
                IpcResponse::error(IpcError::RequestTooLarge.to_string())
            }
            Err(e) => return Err(e.into()),
        };

        IpcServer::send_response(&mut stream, &response).await
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        let manager = &self.manager;

        match request {
            IpcRequest::StartTimer {
                start_time,
                title,
                body,
                primary_color,
            } => match manager
                .start_timer(start_time, &title, &body, primary_color.as_deref())
                .await
            {
                Ok(()) => IpcResponse::success("Timer started", Some(ResponseData::ok())),
                Err(e) => Self::error_response(e),
            },
            IpcRequest::StopTimer => {
                manager.stop_timer().await;
                IpcResponse::success("Timer stopped", Some(ResponseData::ok()))
            }
            IpcRequest::UpdateNotification { title, body } => {
                manager.update_notification(&title, &body).await;
                IpcResponse::success("Notification updated", Some(ResponseData::ok()))
            }
            IpcRequest::IsTimerRunning | IpcRequest::GetElapsedTime => {
                let running = manager.is_timer_running().await;
                let elapsed = manager.get_elapsed_time().await;
                IpcResponse::success("", Some(ResponseData::timer(running, elapsed)))
            }
            IpcRequest::SetAppForegroundState { in_foreground } => {
                manager.set_app_foreground_state(in_foreground).await;
                let message = if in_foreground {
                    "App in foreground"
                } else {
                    "App in background"
                };
                IpcResponse::success(message, Some(ResponseData::ok()))
            }
            IpcRequest::ResetNotificationState => {
                manager.reset_notification_state().await;
                IpcResponse::success("Notification state reset", Some(ResponseData::ok()))
            }
            IpcRequest::MarkNotificationDismissed => {
                manager.mark_notification_dismissed().await;
                IpcResponse::success("Notification marked as dismissed", Some(ResponseData::ok()))
            }
            IpcRequest::AreLiveStatusesAvailable => IpcResponse::success(
                "",
                Some(ResponseData {
                    available: Some(manager.is_live_status_available()),
                    ..ResponseData::default()
                }),
            ),
            IpcRequest::HasActiveLiveStatuses => {
                let has_active = manager.has_active_live_statuses().await;
                let current = manager.current_live_status().await;
                IpcResponse::success(
                    "",
                    Some(ResponseData {
                        has_active: Some(has_active),
                        activity_id: current.map(|p| p.id.to_string()),
                        ..ResponseData::default()
                    }),
                )
            }
            IpcRequest::StartLiveStatus {
                title,
                start_time,
                elapsed_time,
                status,
                primary_color,
            } => match manager
                .start_live_status(
                    &title,
                    &start_time,
                    &elapsed_time,
                    &status,
                    primary_color.as_deref(),
                )
                .await
            {
                Ok(id) => {
                    IpcResponse::success("Live status started", Some(ResponseData::activity(&id)))
                }
                Err(e) => Self::error_response(e),
            },
            IpcRequest::UpdateLiveStatus {
                activity_id,
                elapsed_time,
                status,
            } => {
                let id = PublicationId::from(activity_id);
                match manager.update_live_status(&id, &elapsed_time, &status).await {
                    Ok(()) => IpcResponse::success("Live status updated", Some(ResponseData::ok())),
                    Err(e) => Self::error_response(e),
                }
            }
            IpcRequest::StopLiveStatus { activity_id } => {
                let id = PublicationId::from(activity_id);
                match manager.stop_live_status(&id).await {
                    Ok(()) => IpcResponse::success("Live status stopped", Some(ResponseData::ok())),
                    Err(e) => Self::error_response(e),
                }
            }
            IpcRequest::StopAllLiveStatuses => match manager.stop_all_live_statuses().await {
                Ok(()) => {
                    IpcResponse::success("All live statuses stopped", Some(ResponseData::ok()))
                }
                Err(e) => Self::error_response(e),
            },
            IpcRequest::Signal { signal } => self.handle_signal(signal).await,
        }
    }

    /// Publishes `signal` on the bus, or applies it directly when nothing
    /// listens.
    ///
    /// A "queued" reply only means a listener received the signal; the
    /// manager applies it afterwards on the listener task.
    async fn handle_signal(&self, signal: RemoteSignal) -> IpcResponse {
        let name = signal.as_str();

        let published = match &self.signals {
            Some(bus) => bus.publish(signal.clone()) > 0,
            None => false,
        };
        if published {
            return IpcResponse::success(
                format!("Signal {} queued", name),
                Some(ResponseData::ok()),
            );
        }

        self.manager.handle_remote_signal(signal).await;
        IpcResponse::success(format!("Signal {} handled", name), Some(ResponseData::ok()))
    }

    fn error_response(err: TimerError) -> IpcResponse {
        tracing::debug!(error = %err, "Request failed");
        IpcResponse::error(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
