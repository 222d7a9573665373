use std::net::SocketAddr;
use std::time::Instant;

pub mod udp;

/// Datagram transport towards the transceiver
///
/// Sends are fire-and-forget, receives never block. Each control or data
/// channel uses its own transport instance.
pub trait DatagramTransport: Send {
    /// Bind (and connect) the transport. Destroys any existing socket.
    fn connect(&mut self) -> Result<(), NetworkError>;

    /// Send a single datagram
    fn send(&mut self, payload: &[u8]) -> Result<(), NetworkError>;

    /// Receive all pending datagrams (non-blocking)
    fn receive(&mut self) -> Vec<Datagram>;

    /// Address actually bound, None while unconnected
    fn local_addr(&self) -> Option<SocketAddr>;
}

/// Datagram received from the transceiver
#[derive(Debug, Clone)]
pub struct Datagram {
    pub source: SocketAddr,
    pub payload: Vec<u8>,
    pub timestamp: Instant,
}

/// Network-related errors
#[derive(Debug, Clone)]
pub enum NetworkError {
    ConnectionFailed(String),
    SendFailed(String),
    ReceiveFailed(String),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            NetworkError::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            NetworkError::ReceiveFailed(msg) => write!(f, "Receive failed: {}", msg),
        }
    }
}

impl std::error::Error for NetworkError {}
