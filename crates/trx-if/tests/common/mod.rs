#![allow(dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use trx_config::{SharedConfig, StackConfig};
use trx_if::transports::udp::UdpTransport;
use trx_if::{SessionEvent, TrxInterface};

/// Creates a default config for testing, with a short response timeout
pub fn default_test_config() -> StackConfig {
    let mut cfg = StackConfig::new(42);
    cfg.ctrl.rsp_timeout_ms = 50;
    cfg.radio.power_attenuation = 7;
    cfg
}

/// Transceiver side of a loopback session
pub struct FakeTrx {
    pub ctrl: UdpSocket,
    pub data: UdpSocket,
}

impl FakeTrx {
    pub fn new() -> Self {
        let ctrl = UdpSocket::bind("127.0.0.1:0").unwrap();
        let data = UdpSocket::bind("127.0.0.1:0").unwrap();
        ctrl.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        data.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        Self { ctrl, data }
    }

    /// Interface talking to this transceiver over ephemeral ports
    pub fn interface(&self, config: StackConfig) -> TrxInterface<UdpTransport> {
        let ctrl = UdpTransport::new("127.0.0.1:0".to_string(), self.ctrl.local_addr().unwrap().to_string());
        let data = UdpTransport::new("127.0.0.1:0".to_string(), self.data.local_addr().unwrap().to_string());
        TrxInterface::with_transports(&SharedConfig::from_config(config), ctrl, data).unwrap()
    }

    /// Next control line, NUL terminator stripped
    pub fn recv_cmd(&self) -> (String, SocketAddr) {
        let mut buf = [0u8; 256];
        let (len, from) = self.ctrl.recv_from(&mut buf).unwrap();
        let line = String::from_utf8_lossy(&buf[..len]).trim_end_matches('\0').to_string();
        (line, from)
    }

    pub fn respond(&self, line: &str, to: SocketAddr) {
        let mut payload = line.as_bytes().to_vec();
        payload.push(0);
        self.ctrl.send_to(&payload, to).unwrap();
    }

    pub fn recv_data(&self) -> Vec<u8> {
        let mut buf = [0u8; 512];
        let (len, _) = self.data.recv_from(&mut buf).unwrap();
        buf[..len].to_vec()
    }
}

/// Polls the control channel until `done` holds or a second has passed
pub fn poll_until(
    trx: &mut TrxInterface<UdpTransport>,
    mut done: impl FnMut(&TrxInterface<UdpTransport>, &[SessionEvent]) -> bool,
) -> Vec<SessionEvent> {
    let start = Instant::now();
    let mut events = Vec::new();
    while start.elapsed() < Duration::from_secs(1) {
        events.extend(trx.poll_ctrl(Instant::now()));
        if done(trx, &events) {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    events
}
