//! TCP stream server: accept loop plus one task per accepted connection.

use super::framing::FrameCodec;
use super::is_peer_gone;
use super::session::{SessionId, SessionRegistry};
use crate::error::TransportError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

/// Configuration for the stream server.
#[derive(Debug, Clone)]
pub struct StreamServerConfig {
    /// Address to bind to; port 0 requests an ephemeral port.
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent sessions.
    pub max_connections: usize,
    /// Maximum frame size in bytes.
    pub max_frame_size: usize,
    /// Enable TCP_NODELAY on accepted sockets.
    pub tcp_nodelay: bool,
    /// Capacity of the event channel to the application.
    pub event_capacity: usize,
}

impl Default for StreamServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], crate::DEFAULT_TCP_PORT)),
            max_connections: 64,
            max_frame_size: crate::MAX_FRAME_SIZE,
            tcp_nodelay: true,
            event_capacity: 1024,
        }
    }
}

impl StreamServerConfig {
    /// Creates a config with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    /// Sets the maximum number of concurrent sessions.
    #[must_use]
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }
}

/// Events delivered to the owning application.
///
/// For any session, `SessionOpened` precedes every `Message`, and
/// `SessionClosed` is final.
#[derive(Debug)]
pub enum ServerEvent {
    /// A connection was accepted and its session is live.
    SessionOpened {
        /// Session identifier.
        id: SessionId,
        /// Remote endpoint.
        peer: SocketAddr,
    },
    /// One framed message arrived from a session.
    Message {
        /// Originating session, usable with [`ServerHandle::send_to`].
        id: SessionId,
        /// Raw message bytes, exactly one encoded message.
        bytes: Vec<u8>,
    },
    /// A session closed and left the live set.
    SessionClosed {
        /// Session identifier.
        id: SessionId,
    },
}

/// The accept-loop half of the stream server. Spawn [`StreamServer::run`]
/// and drive it with the [`ServerHandle`].
pub struct StreamServer {
    listener: TcpListener,
    config: StreamServerConfig,
    registry: Arc<SessionRegistry>,
    event_tx: mpsc::Sender<ServerEvent>,
    shutdown: CancellationToken,
}

/// Control handle for a running [`StreamServer`].
#[derive(Clone)]
pub struct ServerHandle {
    registry: Arc<SessionRegistry>,
    shutdown: CancellationToken,
    local_addr: SocketAddr,
}

impl StreamServer {
    /// Binds the listener and returns the server, its control handle, and
    /// the event stream.
    ///
    /// # Errors
    /// Returns [`TransportError::Io`] if binding fails.
    pub async fn bind(
        config: StreamServerConfig,
    ) -> Result<(Self, ServerHandle, mpsc::Receiver<ServerEvent>), TransportError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        let registry = Arc::new(SessionRegistry::new());
        let shutdown = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        tracing::info!(%local_addr, "stream server listening");

        let server = Self {
            listener,
            config,
            registry: Arc::clone(&registry),
            event_tx,
            shutdown: shutdown.clone(),
        };
        let handle = ServerHandle {
            registry,
            shutdown,
            local_addr,
        };
        Ok((server, handle, event_rx))
    }

    /// Runs the accept loop until the handle requests shutdown.
    ///
    /// Accept failures are logged and the loop re-arms; only [`ServerHandle::stop`]
    /// ends it. On shutdown every live session is closed through its own
    /// close path, so clients observe a clean end-of-stream.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.listener.accept() => match result {
                    Ok((stream, peer)) => self.accept_session(stream, peer).await,
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
            }
        }
        self.registry.close_all();
        tracing::info!("stream server stopped");
    }

    async fn accept_session(&self, stream: TcpStream, peer: SocketAddr) {
        if self.registry.count() >= self.config.max_connections {
            tracing::warn!(%peer, "connection limit reached, dropping");
            return;
        }
        if let Err(e) = stream.set_nodelay(self.config.tcp_nodelay) {
            tracing::warn!(%peer, error = %e, "set_nodelay failed");
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = self.shutdown.child_token();
        let id = self.registry.insert(peer, outbound_tx, cancel.clone());
        tracing::info!(session = id, %peer, "session opened");

        // Delivered before the session task starts, so the application sees
        // SessionOpened ahead of any Message from this peer.
        if self
            .event_tx
            .send(ServerEvent::SessionOpened { id, peer })
            .await
            .is_err()
        {
            self.registry.remove(id);
            return;
        }

        let framed = Framed::new(stream, FrameCodec::new(self.config.max_frame_size));
        tokio::spawn(run_session(
            id,
            framed,
            outbound_rx,
            cancel,
            Arc::clone(&self.registry),
            self.event_tx.clone(),
        ));
    }
}

impl ServerHandle {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of live sessions. Non-mutating.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.registry.count()
    }

    /// Enqueues `bytes` to every live session and returns the delivery
    /// count. Individual failures skip that session only.
    pub fn broadcast(&self, bytes: &[u8]) -> usize {
        self.registry.broadcast(bytes)
    }

    /// Enqueues `bytes` for one session.
    ///
    /// # Errors
    /// Returns [`TransportError::UnknownSession`] if the session is gone.
    pub fn send_to(&self, id: SessionId, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.registry.send_to(id, bytes)
    }

    /// Remote endpoint of a session, if it is still live.
    #[must_use]
    pub fn peer_addr(&self, id: SessionId) -> Option<SocketAddr> {
        self.registry.peer_addr(id)
    }

    /// Display label for a session; `"unknown"` once it is gone.
    #[must_use]
    pub fn peer_label(&self, id: SessionId) -> String {
        self.registry.peer_label(id)
    }

    /// Requests that one session close. Idempotent.
    pub fn close_session(&self, id: SessionId) {
        self.registry.close(id);
    }

    /// Stops accepting and closes every live session. Idempotent.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// True once [`stop`](Self::stop) has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Drives one accepted connection until it closes.
///
/// The task owns the socket. On exit it removes its registry entry and emits
/// `SessionClosed`; that removal is the only path out of the live set.
async fn run_session(
    id: SessionId,
    mut framed: Framed<TcpStream, FrameCodec>,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    cancel: CancellationToken,
    registry: Arc<SessionRegistry>,
    event_tx: mpsc::Sender<ServerEvent>,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = SinkExt::<Vec<u8>>::close(&mut framed).await;
                break;
            }
            frame = framed.next() => match frame {
                Some(Ok(bytes)) => {
                    if event_tx
                        .send(ServerEvent::Message { id, bytes: bytes.to_vec() })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Some(Err(e)) if is_peer_gone(&e) => {
                    tracing::info!(session = id, "peer reset connection");
                    break;
                }
                Some(Err(e)) => {
                    tracing::error!(session = id, error = %e, "read failed");
                    break;
                }
                None => {
                    tracing::info!(session = id, "peer disconnected");
                    break;
                }
            },
            msg = outbound_rx.recv() => match msg {
                Some(bytes) => {
                    if let Err(e) = framed.send(bytes).await {
                        if is_peer_gone(&e) {
                            tracing::info!(session = id, "peer gone during write");
                        } else {
                            tracing::error!(session = id, error = %e, "write failed");
                        }
                        break;
                    }
                }
                None => break,
            },
        }
    }
    registry.remove(id);
    let _ = event_tx.send(ServerEvent::SessionClosed { id }).await;
}
