//! UDP datagram client.
//!
//! Fire-and-forget sends and a cancellable receive loop. Delivery, ordering,
//! and duplication are whatever the network gives; consumers needing order
//! must carry sequence numbers in the payload.

use crate::error::TransportError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::{UdpSocket, lookup_host};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Configuration for the datagram client.
#[derive(Debug, Clone)]
pub struct DatagramClientConfig {
    /// Local port to bind; zero requests an OS-assigned ephemeral port.
    pub local_port: u16,
    /// Size of the receive buffer; datagrams larger than this are truncated
    /// by the OS and will fail verification downstream.
    pub recv_buffer_size: usize,
    /// Capacity of the event channel to the application.
    pub event_capacity: usize,
}

impl Default for DatagramClientConfig {
    fn default() -> Self {
        Self {
            local_port: 0,
            recv_buffer_size: crate::MAX_FRAME_SIZE,
            event_capacity: 1024,
        }
    }
}

impl DatagramClientConfig {
    /// Creates a config bound to a specific local port.
    #[must_use]
    pub fn new(local_port: u16) -> Self {
        Self {
            local_port,
            ..Default::default()
        }
    }
}

/// Events emitted by the receive loop.
#[derive(Debug)]
pub enum DatagramEvent {
    /// One datagram arrived.
    Received {
        /// Raw datagram payload.
        bytes: Vec<u8>,
        /// Sender endpoint.
        from: SocketAddr,
    },
}

/// Connectionless send/receive of encoded buffers.
pub struct DatagramClient {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    recv_buffer_size: usize,
    event_tx: mpsc::Sender<DatagramEvent>,
    cancel: CancellationToken,
    started: AtomicBool,
}

impl DatagramClient {
    /// Binds a local datagram endpoint and returns the client plus its event
    /// stream. The receive loop does not run until [`start`](Self::start).
    ///
    /// # Errors
    /// Returns [`TransportError::Io`] if binding fails.
    pub async fn bind(
        config: DatagramClientConfig,
    ) -> Result<(Self, mpsc::Receiver<DatagramEvent>), TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", config.local_port)).await?;
        let local_addr = socket.local_addr()?;
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        tracing::info!(%local_addr, "datagram client bound");
        Ok((
            Self {
                socket: Arc::new(socket),
                local_addr,
                recv_buffer_size: config.recv_buffer_size,
                event_tx,
                cancel: CancellationToken::new(),
                started: AtomicBool::new(false),
            },
            event_rx,
        ))
    }

    /// Local endpoint, with the OS-assigned port for ephemeral binds.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Local port number.
    #[must_use]
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Starts the receive loop. A no-op on a running or stopped client.
    pub fn start(&self) {
        if self.cancel.is_cancelled() || self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let socket = Arc::clone(&self.socket);
        let event_tx = self.event_tx.clone();
        let cancel = self.cancel.clone();
        let mut buf = vec![0u8; self.recv_buffer_size];
        tokio::spawn(async move {
            loop {
                // Cancellation wins over a ready datagram, so nothing is
                // delivered after stop() returns.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    result = socket.recv_from(&mut buf) => match result {
                        Ok((len, from)) => {
                            let event = DatagramEvent::Received {
                                bytes: buf[..len].to_vec(),
                                from,
                            };
                            if event_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "datagram receive failed"),
                    },
                }
            }
            tracing::info!("datagram receive loop stopped");
        });
    }

    /// Stops the receive loop. Idempotent and safe before [`start`](Self::start).
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Fire-and-forget send to a known endpoint. The caller never blocks;
    /// transmission errors are logged and the datagram dropped.
    pub fn send_to(&self, bytes: Vec<u8>, dest: SocketAddr) {
        let socket = Arc::clone(&self.socket);
        tokio::spawn(async move {
            if let Err(e) = socket.send_to(&bytes, dest).await {
                tracing::error!(%dest, error = %e, "datagram send failed");
            }
        });
    }

    /// Resolves `host:port`, then sends. Resolution failure is logged and
    /// the datagram dropped; the caller never blocks.
    pub fn send_to_host(&self, bytes: Vec<u8>, host: impl Into<String>, port: u16) {
        let socket = Arc::clone(&self.socket);
        let host = host.into();
        tokio::spawn(async move {
            let resolved = match lookup_host((host.as_str(), port)).await {
                Ok(mut addrs) => addrs.next(),
                Err(e) => {
                    tracing::error!(host, port, error = %e, "host resolution failed");
                    return;
                }
            };
            let Some(dest) = resolved else {
                tracing::error!(host, port, "no addresses for host");
                return;
            };
            if let Err(e) = socket.send_to(&bytes, dest).await {
                tracing::error!(%dest, error = %e, "datagram send failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_requests_ephemeral_port() {
        let config = DatagramClientConfig::default();
        assert_eq!(config.local_port, 0);
        assert_eq!(config.recv_buffer_size, crate::MAX_FRAME_SIZE);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_reports_port() {
        let (client, _events) = DatagramClient::bind(DatagramClientConfig::default())
            .await
            .unwrap();
        assert_ne!(client.local_port(), 0);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_safe() {
        let (client, _events) = DatagramClient::bind(DatagramClientConfig::default())
            .await
            .unwrap();
        client.stop();
        client.stop();
        // start after stop stays inert
        client.start();
    }
}
