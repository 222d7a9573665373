//! Control session with the transceiver
//!
//! Commands are queued and sent one at a time. The head of the queue stays
//! in flight until a matching response arrives or its retries run out.
//! The session never touches a socket: every input goes through `step`
//! (or `enqueue`), and lines to transmit come back as `SessionEvent::Send`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use trx_config::CfgCtrl;

use crate::{CtrlError, TrxCmd};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transceiver not (or no longer) reachable
    Offline,
    Idle,
    /// Powered up
    Active,
    /// Command in flight
    RspWait,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Line received on the control socket
    Response(String),
    /// Response timer of the head command expired
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Transmit this line to the transceiver
    Send(String),
    /// Power measurement result
    Measurement { khz: u32, dbm: i32 },
    /// The session is dead, the owner is expected to tear the interface down
    Fatal(String),
}

#[derive(Debug)]
struct PendingCmd {
    cmd: TrxCmd,
    retries: u32,
}

/// Parsed `RSP <name> <status> [result...]` line
#[derive(Debug, PartialEq, Eq)]
struct Response<'a> {
    name: &'a str,
    status: Option<i32>,
    result: Vec<&'a str>,
}

/// Splits a response line. None if the line is no response at all.
fn parse_response(line: &str) -> Option<Response<'_>> {
    let body = line.trim_end_matches(['\0', '\n', '\r', ' ']).strip_prefix("RSP ")?;
    let mut tokens = body.split_ascii_whitespace();
    let name = tokens.next()?;
    let status = tokens.next().and_then(|s| s.parse().ok());
    Some(Response { name, status, result: tokens.collect() })
}

pub struct CtrlSession {
    state: SessionState,
    /// State to return to once the command in flight is answered
    prev_state: SessionState,
    queue: VecDeque<PendingCmd>,
    powered_up: bool,
    deadline: Option<Instant>,
    rsp_timeout: Duration,
    retry_limit: u32,
}

impl CtrlSession {
    pub fn new(cfg: &CfgCtrl) -> Self {
        Self {
            state: SessionState::Offline,
            prev_state: SessionState::Offline,
            queue: VecDeque::new(),
            powered_up: false,
            deadline: None,
            rsp_timeout: cfg.rsp_timeout(),
            retry_limit: cfg.retry_limit,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn powered_up(&self) -> bool {
        self.powered_up
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Expiry of the response timer, if a command is in flight
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Queues a command. It is sent right away if nothing else is pending.
    pub fn enqueue(&mut self, cmd: TrxCmd, now: Instant) -> Result<Vec<SessionEvent>, CtrlError> {
        if cmd == TrxCmd::PowerOn && self.powered_up {
            tracing::error!("Suppressing POWERON as we're already powered up");
            return Err(CtrlError::AlreadyPoweredUp);
        }

        tracing::debug!("Adding new control '{}'", cmd);
        self.queue.push_back(PendingCmd { cmd, retries: 0 });

        let mut events = Vec::new();
        if self.queue.len() == 1 {
            self.send_head(now, &mut events);
        }
        Ok(events)
    }

    pub fn step(&mut self, input: SessionInput, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match input {
            SessionInput::Response(line) => self.on_response(&line, now, &mut events),
            SessionInput::Timeout => self.on_timeout(now, &mut events),
        }
        events
    }

    /// Fires the response timer if it has expired
    pub fn poll_timeout(&mut self, now: Instant) -> Vec<SessionEvent> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.step(SessionInput::Timeout, now),
            _ => Vec::new(),
        }
    }

    /// Drops all queued commands and returns to IDLE
    pub fn flush(&mut self) {
        self.queue.clear();
        self.deadline = None;
        self.state = SessionState::Idle;
    }

    /// Flushes the session. A powered transceiver gets a last POWEROFF, not waited for.
    pub fn close(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.powered_up {
            events.push(SessionEvent::Send(TrxCmd::PowerOff.to_line()));
            self.powered_up = false;
        }
        self.flush();
        self.state = SessionState::Offline;
        events
    }

    fn send_head(&mut self, now: Instant, events: &mut Vec<SessionEvent>) {
        let Some(head) = self.queue.front() else {
            return;
        };

        tracing::debug!("Sending control '{}'", head.cmd);
        events.push(SessionEvent::Send(head.cmd.to_line()));

        if self.state != SessionState::RspWait {
            self.prev_state = self.state;
            self.state = SessionState::RspWait;
        }
        self.deadline = Some(now + self.rsp_timeout);
    }

    fn fatal(&mut self, reason: String, events: &mut Vec<SessionEvent>) {
        tracing::error!("Control session failed: {}", reason);
        self.queue.clear();
        self.deadline = None;
        self.powered_up = false;
        self.state = SessionState::Offline;
        events.push(SessionEvent::Fatal(reason));
    }

    fn on_timeout(&mut self, now: Instant, events: &mut Vec<SessionEvent>) {
        let retry_limit = self.retry_limit;
        // Queue may have been flushed meanwhile
        let Some(head) = self.queue.front_mut() else {
            self.deadline = None;
            return;
        };

        tracing::info!("No response from transceiver to '{}'", head.cmd);
        head.retries += 1;
        if head.retries <= retry_limit {
            self.send_head(now, events);
            return;
        }

        if head.cmd.is_critical() {
            let reason = format!("transceiver offline, '{}' unanswered", head.cmd);
            self.fatal(reason, events);
            return;
        }

        tracing::warn!("Giving up on '{}'", head.cmd);
        self.queue.pop_front();
        self.deadline = None;
        self.state = self.prev_state;
        self.send_head(now, events);
    }

    fn on_response(&mut self, line: &str, now: Instant, events: &mut Vec<SessionEvent>) {
        let Some(rsp) = parse_response(line) else {
            tracing::info!("Unknown message on CTRL port: {}", line.trim_end_matches('\0'));
            return;
        };
        tracing::debug!("Response message: '{}'", line.trim_end_matches('\0'));

        let Some(head) = self.queue.front() else {
            tracing::info!("Response message without command");
            return;
        };
        let critical = head.cmd.is_critical();

        if rsp.name != head.cmd.name() {
            if critical {
                let reason = format!("response '{}' does not match command '{}'", rsp.name, head.cmd);
                self.fatal(reason, events);
            } else {
                // Keep waiting for the right one
                tracing::error!("Response '{}' does not match command '{}'", rsp.name, head.cmd);
            }
            return;
        }

        let Some(status) = rsp.status else {
            let err = CtrlError::MalformedResponse(line.trim_end_matches('\0').to_string());
            if critical {
                self.fatal(err.to_string(), events);
            } else {
                tracing::error!("{}", err);
            }
            return;
        };

        if status != 0 {
            if critical {
                let reason = format!("transceiver rejected '{}' with status {}", head.cmd, status);
                self.fatal(reason, events);
                return;
            }
            tracing::error!("Transceiver rejected '{}' with status {}", head.cmd, status);
        }

        let Some(PendingCmd { cmd, .. }) = self.queue.pop_front() else {
            return;
        };
        self.deadline = None;

        self.state = match cmd {
            TrxCmd::PowerOn => {
                self.powered_up = true;
                SessionState::Active
            }
            TrxCmd::PowerOff => {
                self.powered_up = false;
                SessionState::Idle
            }
            TrxCmd::Echo => SessionState::Idle,
            _ => self.prev_state,
        };
        if matches!(cmd, TrxCmd::Measure { .. }) && status == 0 {
            self.on_measure_result(&rsp.result, line, events);
        }

        self.send_head(now, events);
    }

    fn on_measure_result(&self, result: &[&str], line: &str, events: &mut Vec<SessionEvent>) {
        match result {
            [khz, dbm, ..] => match (khz.parse(), dbm.parse()) {
                (Ok(khz), Ok(dbm)) => events.push(SessionEvent::Measurement { khz, dbm }),
                _ => tracing::error!("{}", CtrlError::MalformedResponse(line.to_string())),
            },
            _ => tracing::error!("{}", CtrlError::MalformedResponse(line.to_string())),
        }
    }
}
