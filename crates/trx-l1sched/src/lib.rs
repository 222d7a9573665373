//! TDMA burst scheduler for the transceiver connector
//!
//! Maps every (timeslot, frame number) pair to a logical channel using static
//! multiframe layouts, assembles and renders bursts for the channel types,
//! applies A5 ciphering and compensates for lost downlink frames.

pub mod a5;
pub mod clock;
pub mod error;
pub mod event_queue;
pub mod handlers;
pub mod lchan;
pub mod lchan_desc;
pub mod meas;
pub mod mframe;
pub mod prim;
pub mod sched;
pub mod timeslot;

pub use error::SchedError;
pub use event_queue::{EventQueue, L1Event};
pub use lchan_desc::LchanType;
pub use prim::TxPrim;
pub use sched::{RxBurst, Scheduler, TxBurst};
