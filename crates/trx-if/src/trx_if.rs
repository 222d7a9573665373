use std::net::SocketAddr;
use std::time::Instant;

use trx_config::SharedConfig;
use trx_core::assert_warn;
use trx_l1sched::TxBurst;

use crate::session::{CtrlSession, SessionEvent, SessionInput, SessionState};
use crate::transports::udp::UdpTransport;
use crate::transports::{DatagramTransport, NetworkError};
use crate::trxd::{TrxdRxInd, TrxdTxReq};
use crate::{CtrlError, TrxCmd};

/// Control and burst channels to one transceiver
pub struct TrxInterface<T: DatagramTransport = UdpTransport> {
    ctrl: T,
    data: T,
    session: CtrlSession,
    trxd_version: u8,
    /// Attenuation sent with every uplink burst
    tx_att: u8,
}

impl TrxInterface<UdpTransport> {
    /// Binds both UDP channels as configured
    pub fn open(config: &SharedConfig) -> Result<Self, NetworkError> {
        let cfg = config.config();
        tracing::info!("Init transceiver interface ({}:{})", cfg.trx.remote_host, cfg.trx.base_port);

        let ctrl = UdpTransport::new(cfg.trx.ctrl_local(), cfg.trx.ctrl_remote());
        let data = UdpTransport::new(cfg.trx.data_local(), cfg.trx.data_remote());
        Self::with_transports(config, ctrl, data)
    }
}

impl<T: DatagramTransport> TrxInterface<T> {
    pub fn with_transports(config: &SharedConfig, mut ctrl: T, mut data: T) -> Result<Self, NetworkError> {
        let cfg = config.config();
        ctrl.connect()?;
        data.connect()?;
        Ok(Self {
            ctrl,
            data,
            session: CtrlSession::new(&cfg.ctrl),
            trxd_version: cfg.trx.trxd_version,
            tx_att: cfg.radio.power_attenuation,
        })
    }

    pub fn session(&self) -> &CtrlSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Locally bound control and data addresses
    pub fn local_addrs(&self) -> (Option<SocketAddr>, Option<SocketAddr>) {
        (self.ctrl.local_addr(), self.data.local_addr())
    }

    /// When `poll_ctrl` needs to run at the latest
    pub fn deadline(&self) -> Option<Instant> {
        self.session.deadline()
    }

    /// Queues a control command
    pub fn submit(&mut self, cmd: TrxCmd, now: Instant) -> Result<(), CtrlError> {
        let events = self.session.enqueue(cmd, now)?;
        // Nothing but sends come out of an enqueue
        let rest = self.dispatch(events);
        assert_warn!(rest.is_empty(), "unexpected session events {:?}", rest);
        Ok(())
    }

    /// Handles control responses and the response timer.
    /// Returns the session events meant for the owner.
    pub fn poll_ctrl(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for msg in self.ctrl.receive() {
            let line = String::from_utf8_lossy(&msg.payload).into_owned();
            events.extend(self.session.step(SessionInput::Response(line), now));
        }
        events.extend(self.session.poll_timeout(now));
        self.dispatch(events)
    }

    /// Decodes all pending burst indications. Malformed ones are logged and dropped.
    pub fn poll_data(&mut self) -> Vec<TrxdRxInd> {
        let mut inds = Vec::new();
        for msg in self.data.receive() {
            match TrxdRxInd::decode(&msg.payload) {
                Ok(ind) => {
                    tracing::trace!(
                        frame = ind.frame.value(),
                        "RX burst tn={} rssi={} toa256={}",
                        ind.tn,
                        ind.rssi,
                        ind.toa256
                    );
                    inds.push(ind);
                }
                Err(e) => tracing::warn!("Dropping TRXD datagram from {}: {}", msg.source, e),
            }
        }
        inds
    }

    /// Sends an uplink burst
    pub fn tx_burst(&mut self, burst: &TxBurst) -> Result<(), NetworkError> {
        tracing::trace!(frame = burst.frame.value(), "TX burst tn={} att={}", burst.tn, self.tx_att);
        let req = TrxdTxReq::from_burst(burst, self.trxd_version, self.tx_att);
        self.data.send(&req.encode())
    }

    /// Drops all pending control commands
    pub fn flush(&mut self) {
        self.session.flush();
    }

    /// Shuts the session down, powering the transceiver off if it was on
    pub fn close(&mut self) {
        tracing::info!("Shutdown transceiver interface");
        let events = self.session.close();
        self.dispatch(events);
    }

    /// Transmits the lines the session asked for, returns everything else
    fn dispatch(&mut self, events: Vec<SessionEvent>) -> Vec<SessionEvent> {
        let mut rest = Vec::new();
        for event in events {
            match event {
                SessionEvent::Send(line) => {
                    let mut payload = line.into_bytes();
                    payload.push(0);
                    if let Err(e) = self.ctrl.send(&payload) {
                        // Retried by the session timer
                        tracing::warn!("Control send failed: {}", e);
                    }
                }
                other => rest.push(other),
            }
        }
        rest
    }
}
