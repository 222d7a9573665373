use std::net::{SocketAddr, UdpSocket};
use std::time::Instant;

use super::{Datagram, DatagramTransport, NetworkError};

/// Largest datagram the transceiver sends
const MAX_DATAGRAM: usize = 1500;

/// UDP transport, bound to a local port and connected to the transceiver's
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    bind_addr: String,
    remote_addr: String,
    buffer: Vec<u8>,
}

impl UdpTransport {
    pub fn new(bind_addr: String, remote_addr: String) -> Self {
        Self {
            socket: None,
            bind_addr,
            remote_addr,
            buffer: vec![0u8; MAX_DATAGRAM],
        }
    }

    fn ensure_connected(&mut self) -> Result<&UdpSocket, NetworkError> {
        if self.socket.is_none() {
            self.connect()?;
        }
        self.socket.as_ref().ok_or_else(|| NetworkError::SendFailed("No active socket".to_string()))
    }
}

impl DatagramTransport for UdpTransport {
    fn connect(&mut self) -> Result<(), NetworkError> {
        self.socket = None;
        let socket = UdpSocket::bind(&self.bind_addr)
            .map_err(|e| NetworkError::ConnectionFailed(format!("UDP bind to {} failed: {}", self.bind_addr, e)))?;
        socket
            .connect(&self.remote_addr)
            .map_err(|e| NetworkError::ConnectionFailed(format!("UDP connect to {} failed: {}", self.remote_addr, e)))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| NetworkError::ConnectionFailed(format!("Failed to set non-blocking: {}", e)))?;

        tracing::debug!("UDP {} -> {}", self.bind_addr, self.remote_addr);
        self.socket = Some(socket);
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), NetworkError> {
        let socket = self.ensure_connected()?;
        socket
            .send(payload)
            .map_err(|e| NetworkError::SendFailed(format!("UDP send failed: {}", e)))?;
        Ok(())
    }

    fn receive(&mut self) -> Vec<Datagram> {
        let mut messages = Vec::new();
        let Some(ref socket) = self.socket else {
            return messages;
        };

        loop {
            match socket.recv_from(&mut self.buffer) {
                Ok((len, source)) => {
                    messages.push(Datagram {
                        source,
                        payload: self.buffer[..len].to_vec(),
                        timestamp: Instant::now(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    break; // No more data
                }
                Err(e) => {
                    // Typically ICMP port unreachable while the transceiver is not up yet
                    tracing::trace!("{}", NetworkError::ReceiveFailed(e.to_string()));
                    break;
                }
            }
        }

        messages
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref()?.local_addr().ok()
    }
}
