//! IPC Server for the focus coach daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer and coach commands
//! - Dispatch to the timer service and the coach

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};

use crate::coach::Coach;
use crate::types::{IpcRequest, IpcResponse, ResponseData};

use super::service::TimerHandle;

// ============================================================================
// Constants
// ============================================================================

/// Socket location relative to the home directory
pub const DEFAULT_SOCKET_PATH: &str = ".focus-coach/focus-coach.sock";

/// Maximum request size in bytes (64KB)
const MAX_REQUEST_SIZE: usize = 65536;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns the default socket path under the home directory.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(DEFAULT_SOCKET_PATH))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// The client closed the connection without sending a request
    #[error("Connection closed by client")]
    ConnectionClosed,
}

impl IpcError {
    /// Returns true if the client should be told about the failure.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::ConnectionClosed)
    }
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
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
        // Remove a stale socket left by a previous run
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

        tracing::info!(path = ?socket_path, "IPC server listening");

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

    /// Reads one request. The client half-closes its side after writing.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::new();
        let limit = (MAX_REQUEST_SIZE + 1) as u64;

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            (&mut *stream).take(limit).read_to_end(&mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        }

        if buffer.is_empty() {
            return Err(IpcError::ConnectionClosed.into());
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest =
            serde_json::from_slice(&buffer).context("Failed to deserialize IPC request")?;

        Ok(request)
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
        stream
            .shutdown()
            .await
            .context("Failed to close response stream")?;

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

/// Serves one connection: read a request, handle it, write the response.
pub async fn handle_connection(mut stream: UnixStream, handler: Arc<RequestHandler>) -> Result<()> {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => {
            tracing::debug!(?request, "Received IPC request");
            handler.handle(request).await
        }
        Err(e) => {
            if e
                .downcast_ref::<IpcError>()
                .is_some_and(|e| !e.is_reportable())
            {
                tracing::debug!("Client closed the connection without a request");
                return Ok(());
            }
            tracing::warn!(error = %e, "Invalid IPC request");
            IpcResponse::error(format!("{e:#}"))
        }
    };

    IpcServer::send_response(&mut stream, &response).await
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the timer service and the coach.
pub struct RequestHandler {
    timer: TimerHandle,
    coach: Arc<Coach>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(timer: TimerHandle, coach: Arc<Coach>) -> Self {
        Self { timer, coach }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Status => self.handle_status(),
            IpcRequest::Chat { message } => self.handle_chat(&message).await,
            IpcRequest::History => self.handle_history().await,
            IpcRequest::Listen => self.handle_listen().await,
        }
    }

    /// Handles the start command. Starting while a session runs is not an error.
    async fn handle_start(&self) -> IpcResponse {
        match self.timer.start_focus().await {
            Ok(started) => {
                let message = if started {
                    "Focus session started"
                } else {
                    "Focus session already in progress"
                };
                IpcResponse::success(message, Some(self.snapshot_data()))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_reset(&self) -> IpcResponse {
        match self.timer.reset().await {
            Ok(()) => IpcResponse::success("Timer reset", Some(self.snapshot_data())),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn handle_status(&self) -> IpcResponse {
        IpcResponse::success("", Some(self.snapshot_data()))
    }

    async fn handle_chat(&self, message: &str) -> IpcResponse {
        match self.coach.handle_user_message(message).await {
            Ok(reply) => {
                let mut data = self.snapshot_data();
                data.reply = Some(reply.content);
                IpcResponse::success("", Some(data))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_listen(&self) -> IpcResponse {
        match self.coach.listen().await {
            Ok((transcript, reply)) => {
                let mut data = self.snapshot_data();
                data.transcript = Some(transcript);
                data.reply = Some(reply.content);
                IpcResponse::success("", Some(data))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_history(&self) -> IpcResponse {
        let data = ResponseData {
            messages: Some(self.coach.history().await),
            ..Default::default()
        };
        IpcResponse::success("", Some(data))
    }

    fn snapshot_data(&self) -> ResponseData {
        ResponseData::from_snapshot(&self.timer.snapshot())
    }
}

// ============================================================================
// Tests
// ============================================================================
