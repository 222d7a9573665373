//! Per channel type burst handlers
//!
//! Receive handlers reassemble bursts into blocks and raise events upwards,
//! transmit handlers render the primitive of a channel into bursts.

use trx_core::{FrameNumber, UBit};

use crate::EventQueue;
use crate::lchan::Lchan;
use crate::lchan_desc::HandlerKind;
use crate::sched::RxBurst;

pub mod block;
pub mod rach;
pub mod sch;

/// Hands a received burst to the handler of its channel type
pub fn handle_rx(lchan: &mut Lchan, burst: &RxBurst, bid: u8, events: &mut EventQueue) {
    match lchan.lchan_type.desc().handler {
        HandlerKind::Block => block::rx(lchan, burst, bid, events),
        HandlerKind::Sch => sch::rx(lchan, burst, events),
        HandlerKind::Rach | HandlerKind::None => {}
    }
}

/// Renders the burst `bid` of the channel's current primitive, if any
pub fn handle_tx(
    lchan: &mut Lchan,
    frame: FrameNumber,
    bid: u8,
    tsc: u8,
    events: &mut EventQueue,
) -> Option<Vec<UBit>> {
    match lchan.lchan_type.desc().handler {
        HandlerKind::Block => block::tx(lchan, frame, bid, tsc, events),
        HandlerKind::Rach => rach::tx(lchan, frame, events),
        HandlerKind::Sch | HandlerKind::None => None,
    }
}
