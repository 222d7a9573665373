//! Synchronization channel

use trx_core::burst::sb_payload;

use crate::lchan::Lchan;
use crate::meas::Measurement;
use crate::sched::RxBurst;
use crate::{EventQueue, L1Event};

pub fn rx(lchan: &mut Lchan, burst: &RxBurst, events: &mut EventQueue) {
    if burst.substituted {
        return;
    }
    let Some(bits) = sb_payload(&burst.bits) else {
        tracing::warn!(frame = burst.frame.value(), "TS{} SCH: unexpected burst length {}", lchan.tn, burst.bits.len());
        return;
    };

    tracing::trace!(frame = burst.frame.value(), "TS{} SCH rssi={} toa256={}", lchan.tn, burst.rssi, burst.toa256);
    events.push_back(L1Event::SchInd {
        frame: burst.frame,
        tn: lchan.tn,
        bits,
        meas: Measurement { frame: burst.frame, toa256: burst.toa256, rssi: burst.rssi },
    });
}
