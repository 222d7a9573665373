//! Random access: one access burst per primitive

use trx_core::burst::{AB_DATA_BITS, build_access_burst};
use trx_core::{FrameNumber, UBit};

use crate::lchan::Lchan;
use crate::{EventQueue, L1Event};

pub fn tx(lchan: &mut Lchan, frame: FrameNumber, events: &mut EventQueue) -> Option<Vec<UBit>> {
    let prim = lchan.prim.take()?;
    if prim.bits.len() != AB_DATA_BITS {
        tracing::error!(
            frame = frame.value(),
            "TS{} {}: access burst needs {} coded bits, got {}",
            lchan.tn,
            lchan.lchan_type,
            AB_DATA_BITS,
            prim.bits.len()
        );
        return None;
    }

    tracing::debug!(frame = frame.value(), "TS{} {}: sending access burst", lchan.tn, lchan.lchan_type);
    let burst = build_access_burst(&prim.bits);
    events.push_back(L1Event::DataCnf { frame, tn: lchan.tn, chan_nr: prim.chan_nr, link_id: prim.link_id });
    Some(burst)
}
