//! UDP transport: connectionless datagram client.

pub mod client;

pub use client::{DatagramClient, DatagramClientConfig, DatagramEvent};
