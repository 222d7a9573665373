//! Transceiver interface
//!
//! Two datagram sockets connect to the transceiver: a textual control
//! channel driven by the `CtrlSession` state machine, and a binary burst
//! channel carrying TRXD messages. `TrxInterface` owns both.

pub mod cmd;
pub mod error;
pub mod session;
pub mod transports;
pub mod trx_if;
pub mod trxd;

pub use cmd::TrxCmd;
pub use error::{CtrlError, TrxdError};
pub use session::{CtrlSession, SessionEvent, SessionInput, SessionState};
pub use trx_if::TrxInterface;
