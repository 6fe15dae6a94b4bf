//! IPC Client for communicating with the native timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::cli::commands::{LiveStartArgs, StartArgs};
use crate::types::{IpcRequest, IpcResponse, RemoteSignal};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: usize = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client for the given socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    // ------------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------------

    /// Starts a session at `args.start_time`, or now.
    pub async fn start_timer(&self, args: &StartArgs) -> Result<IpcResponse> {
        let start_time = args
            .start_time
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        self.send(&IpcRequest::StartTimer {
            start_time,
            title: args.title.clone(),
            body: args.body.clone(),
            primary_color: args.color.clone(),
        })
        .await
    }

    pub async fn stop_timer(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::StopTimer).await
    }

    pub async fn update_notification(&self, title: &str, body: &str) -> Result<IpcResponse> {
        self.send(&IpcRequest::UpdateNotification {
            title: title.to_string(),
            body: body.to_string(),
        })
        .await
    }

    /// Queries running state and elapsed time.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::IsTimerRunning).await
    }

    // ------------------------------------------------------------------------
    // Foreground / notification state
    // ------------------------------------------------------------------------

    pub async fn set_foreground(&self, in_foreground: bool) -> Result<IpcResponse> {
        self.send(&IpcRequest::SetAppForegroundState { in_foreground })
            .await
    }

    pub async fn reset_notification(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::ResetNotificationState).await
    }

    pub async fn dismiss_notification(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::MarkNotificationDismissed).await
    }

    // ------------------------------------------------------------------------
    // Live status
    // ------------------------------------------------------------------------

    pub async fn live_available(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::AreLiveStatusesAvailable).await
    }

    pub async fn live_active(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::HasActiveLiveStatuses).await
    }

    /// Starts a live status; the start label defaults to the local `HH:MM`.
    pub async fn start_live(&self, args: &LiveStartArgs) -> Result<IpcResponse> {
        let start_time = args
            .start_time
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%H:%M").to_string());

        self.send(&IpcRequest::StartLiveStatus {
            title: args.title.clone(),
            start_time,
            elapsed_time: args.elapsed.clone(),
            status: args.status.clone(),
            primary_color: args.color.clone(),
        })
        .await
    }

    pub async fn update_live(&self, id: &str, elapsed: &str, status: &str) -> Result<IpcResponse> {
        self.send(&IpcRequest::UpdateLiveStatus {
            activity_id: id.to_string(),
            elapsed_time: elapsed.to_string(),
            status: status.to_string(),
        })
        .await
    }

    pub async fn stop_live(&self, id: &str) -> Result<IpcResponse> {
        self.send(&IpcRequest::StopLiveStatus {
            activity_id: id.to_string(),
        })
        .await
    }

    pub async fn stop_all_live(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::StopAllLiveStatuses).await
    }

    /// Injects a remote signal into the daemon.
    pub async fn signal(&self, signal: RemoteSignal) -> Result<IpcResponse> {
        self.send(&IpcRequest::Signal { signal }).await
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    /// Sends a request to the daemon with retry logic.
    ///
    /// # Errors
    ///
    /// Returns the last error if every attempt fails, or the daemon's
    /// message if it answered with an error response.
    pub async fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_request(request).await {
                Ok(response) => return Self::check(response),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max = MAX_RETRIES,
                        command = request.command(),
                        "Request failed: {:#}",
                        e
                    );
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("No request attempts were made")))
    }

    fn check(response: IpcResponse) -> Result<IpcResponse> {
        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }
        Ok(response)
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to the daemon at {:?}; start it with 'native-timer daemon'",
                    self.socket_path
                )
            })?;

        let request_json = serde_json::to_string(request).context("Failed to serialize request")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("Write timed out")?
        .context("Failed to send request")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("Flush timed out")?
            .context("Failed to flush request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("Failed to shut down the write side")?;

        let mut buffer = vec![0u8; MAX_RESPONSE_SIZE];
        let n = timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if n == 0 {
            anyhow::bail!("The daemon closed the connection without a response");
        }

        serde_json::from_slice(&buffer[..n]).context("Failed to parse response")
    }
}

// ============================================================================
// Tests
// ============================================================================
