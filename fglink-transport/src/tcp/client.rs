//! TCP stream client.
//!
//! The client is an actor: the application spawns [`StreamClient::run`],
//! sends [`ClientCommand`]s through the [`ClientHandle`], and consumes
//! [`ClientEvent`]s from the channel returned by [`StreamClient::new`].
//! Dropping the handle closes the command channel and implicitly
//! disconnects.

use super::framing::FrameCodec;
use super::is_peer_gone;
use crate::error::TransportError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

/// Configuration for the stream client.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum frame size in bytes.
    pub max_frame_size: usize,
    /// Enable TCP_NODELAY.
    pub tcp_nodelay: bool,
    /// Capacity of the event channel to the application.
    pub event_capacity: usize,
}

impl Default for StreamClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_frame_size: crate::MAX_FRAME_SIZE,
            tcp_nodelay: true,
            event_capacity: 1024,
        }
    }
}

impl StreamClientConfig {
    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }
}

/// Commands accepted by the client task.
#[derive(Debug)]
pub enum ClientCommand {
    /// Resolve `host:port` and connect, tearing down any live connection
    /// first.
    Connect {
        /// Host name or address.
        host: String,
        /// Port number.
        port: u16,
    },
    /// Send one encoded message over the live connection.
    Send(Vec<u8>),
    /// Orderly shutdown of the live connection. A no-op when disconnected.
    Disconnect,
}

/// Events emitted by the client task.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The connection is up. Exactly one of `Connected`/`ConnectFailed`
    /// follows each `Connect` command.
    Connected(SocketAddr),
    /// The connection attempt failed.
    ConnectFailed(String),
    /// One framed message arrived.
    Message(Vec<u8>),
    /// The connection went down: peer departure, I/O fault, or a requested
    /// disconnect. Emitted exactly once per live connection.
    Disconnected,
}

/// Why one driven connection ended.
enum LinkExit {
    /// Peer gone, I/O fault, or requested disconnect.
    Disconnected,
    /// A new `Connect` command arrived while connected.
    Reconnect { host: String, port: u16 },
    /// The command channel closed; the client task should exit.
    Shutdown,
}

/// The run-loop half of the stream client.
pub struct StreamClient {
    config: StreamClientConfig,
    cmd_rx: mpsc::Receiver<ClientCommand>,
    event_tx: mpsc::Sender<ClientEvent>,
}

/// Handle for sending commands to a running [`StreamClient`].
#[derive(Clone)]
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
}

impl StreamClient {
    /// Creates the client task, its handle, and the event stream.
    #[must_use]
    pub fn new(
        config: StreamClientConfig,
    ) -> (Self, ClientHandle, mpsc::Receiver<ClientEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let client = Self {
            config,
            cmd_rx,
            event_tx,
        };
        (client, ClientHandle { cmd_tx }, event_rx)
    }

    /// Runs the client until its handle is dropped.
    pub async fn run(mut self) {
        let mut pending: Option<(String, u16)> = None;
        loop {
            let (host, port) = match pending.take() {
                Some(target) => target,
                None => match self.cmd_rx.recv().await {
                    Some(ClientCommand::Connect { host, port }) => (host, port),
                    Some(ClientCommand::Send(_)) => {
                        tracing::warn!("send while disconnected, message dropped");
                        continue;
                    }
                    Some(ClientCommand::Disconnect) => continue,
                    None => break,
                },
            };

            let Some(mut framed) = self.establish(&host, port).await else {
                continue;
            };
            match self.drive(&mut framed).await {
                LinkExit::Disconnected => {
                    let _ = self.event_tx.send(ClientEvent::Disconnected).await;
                }
                LinkExit::Reconnect { host, port } => {
                    let _ = self.event_tx.send(ClientEvent::Disconnected).await;
                    pending = Some((host, port));
                }
                LinkExit::Shutdown => {
                    let _ = self.event_tx.send(ClientEvent::Disconnected).await;
                    break;
                }
            }
            // framed drops here, closing the socket
        }
        tracing::info!("stream client stopped");
    }

    /// Resolves and connects. Emits exactly one `Connected` or
    /// `ConnectFailed` event.
    async fn establish(
        &mut self,
        host: &str,
        port: u16,
    ) -> Option<Framed<TcpStream, FrameCodec>> {
        let attempt = TcpStream::connect((host, port));
        let stream = match tokio::time::timeout(self.config.connect_timeout, attempt).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::error!(host, port, error = %e, "connect failed");
                let _ = self
                    .event_tx
                    .send(ClientEvent::ConnectFailed(e.to_string()))
                    .await;
                return None;
            }
            Err(_) => {
                tracing::error!(host, port, "connect timed out");
                let _ = self
                    .event_tx
                    .send(ClientEvent::ConnectFailed(
                        TransportError::ConnectTimeout.to_string(),
                    ))
                    .await;
                return None;
            }
        };

        if let Err(e) = stream.set_nodelay(self.config.tcp_nodelay) {
            tracing::warn!(error = %e, "set_nodelay failed");
        }
        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(e) => {
                let _ = self
                    .event_tx
                    .send(ClientEvent::ConnectFailed(e.to_string()))
                    .await;
                return None;
            }
        };
        tracing::info!(%peer, "connected");
        let _ = self.event_tx.send(ClientEvent::Connected(peer)).await;
        Some(Framed::new(
            stream,
            FrameCodec::new(self.config.max_frame_size),
        ))
    }

    /// Drives one live connection: inbound frames become `Message` events,
    /// `Send` commands go out through the framed sink (one write in flight).
    async fn drive(&mut self, framed: &mut Framed<TcpStream, FrameCodec>) -> LinkExit {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(ClientCommand::Send(bytes)) => {
                        if let Err(e) = framed.send(bytes).await {
                            if is_peer_gone(&e) {
                                tracing::info!("peer gone during write");
                            } else {
                                tracing::error!(error = %e, "write failed");
                            }
                            return LinkExit::Disconnected;
                        }
                    }
                    Some(ClientCommand::Connect { host, port }) => {
                        return LinkExit::Reconnect { host, port };
                    }
                    Some(ClientCommand::Disconnect) => {
                        let _ = SinkExt::<Vec<u8>>::close(framed).await;
                        return LinkExit::Disconnected;
                    }
                    None => return LinkExit::Shutdown,
                },
                frame = framed.next() => match frame {
                    Some(Ok(bytes)) => {
                        let _ = self
                            .event_tx
                            .send(ClientEvent::Message(bytes.to_vec()))
                            .await;
                    }
                    Some(Err(e)) if is_peer_gone(&e) => {
                        tracing::info!("connection reset by server");
                        return LinkExit::Disconnected;
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "read failed");
                        return LinkExit::Disconnected;
                    }
                    None => {
                        tracing::info!("server closed the connection");
                        return LinkExit::Disconnected;
                    }
                },
            }
        }
    }
}

impl ClientHandle {
    /// Requests a connection to `host:port`. Exactly one `Connected` or
    /// `ConnectFailed` event follows each accepted request.
    ///
    /// # Errors
    /// Returns a channel error if the client task has stopped.
    pub async fn connect(
        &self,
        host: impl Into<String>,
        port: u16,
    ) -> Result<(), TransportError> {
        self.cmd_tx
            .send(ClientCommand::Connect {
                host: host.into(),
                port,
            })
            .await
            .map_err(|_| TransportError::channel("client task stopped"))
    }

    /// Queues one encoded message for sending. Dropped with a logged
    /// warning if the client is not connected.
    ///
    /// # Errors
    /// Returns a channel error if the client task has stopped.
    pub async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.cmd_tx
            .send(ClientCommand::Send(bytes))
            .await
            .map_err(|_| TransportError::channel("client task stopped"))
    }

    /// Requests an orderly disconnect. Idempotent.
    ///
    /// # Errors
    /// Returns a channel error if the client task has stopped.
    pub async fn disconnect(&self) -> Result<(), TransportError> {
        self.cmd_tx
            .send(ClientCommand::Disconnect)
            .await
            .map_err(|_| TransportError::channel("client task stopped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = StreamClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_frame_size, crate::MAX_FRAME_SIZE);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_config_builder() {
        let config = StreamClientConfig::default()
            .connect_timeout(Duration::from_millis(250))
            .max_frame_size(4096);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.max_frame_size, 4096);
    }

    #[tokio::test]
    async fn test_run_exits_when_handle_dropped() {
        let (client, handle, _events) = StreamClient::new(StreamClientConfig::default());
        let task = tokio::spawn(client.run());
        drop(handle);
        task.await.unwrap();
    }
}
