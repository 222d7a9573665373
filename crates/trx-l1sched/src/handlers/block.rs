//! Multi-burst blocks: xCCH, SACCH, CBCH, PTCCH, traffic and packet data channels

use trx_core::burst::{GSM_NBITS_NB_GMSK_PAYLOAD, build_normal_burst, nb_payload};
use trx_core::{FrameNumber, UBit};

use crate::lchan::Lchan;
use crate::meas::Measurement;
use crate::sched::RxBurst;
use crate::{EventQueue, L1Event};

pub fn rx(lchan: &mut Lchan, burst: &RxBurst, bid: u8, events: &mut EventQueue) {
    let desc = lchan.lchan_type.desc();

    let Some(payload) = nb_payload(&burst.bits) else {
        tracing::warn!(frame = burst.frame.value(), "TS{} {}: unexpected burst length {}", lchan.tn, lchan.lchan_type, burst.bits.len());
        return;
    };
    let plen = payload.len();

    if bid == 0 {
        lchan.rx_mask = 0;
        lchan.rx_burst_len = plen;
        lchan.rx_first_fn = burst.frame;
        lchan.rx_bursts.fill(0);
    } else if plen != lchan.rx_burst_len {
        // Block start missed, or modulation changed within the block
        tracing::debug!(frame = burst.frame.value(), "TS{} {}: dropping bid={} of unknown block", lchan.tn, lchan.lchan_type, bid);
        return;
    }

    let offset = bid as usize * plen;
    let Some(slot) = lchan.rx_bursts.get_mut(offset..offset + plen) else {
        tracing::warn!(frame = burst.frame.value(), "TS{} {}: burst of {} bits does not fit", lchan.tn, lchan.lchan_type, plen);
        return;
    };
    slot.copy_from_slice(&payload);
    if !burst.substituted {
        lchan.rx_mask |= 1 << bid;
    }

    tracing::trace!(frame = burst.frame.value(), "TS{} {} bid={} rssi={} toa256={}", lchan.tn, lchan.lchan_type, bid, burst.rssi, burst.toa256);

    if (bid as usize) + 1 < desc.bursts {
        return;
    }

    let lost_bursts = desc.bursts - lchan.rx_mask.count_ones() as usize;
    if lost_bursts > 0 {
        tracing::warn!(
            frame = burst.frame.value(),
            "TS{} {}: block incomplete, mask=0x{:x}, {} burst(s) missing",
            lchan.tn,
            lchan.lchan_type,
            lchan.rx_mask,
            lost_bursts
        );
    }

    let meas = lchan
        .meas
        .average(desc.bursts.min(lchan.meas.len()))
        .unwrap_or(Measurement { frame: burst.frame, toa256: burst.toa256, rssi: burst.rssi });

    events.push_back(L1Event::DataInd {
        frame: lchan.rx_first_fn,
        tn: lchan.tn,
        chan_nr: lchan.chan_nr(),
        link_id: lchan.link_id(),
        bits: lchan.rx_bursts[..desc.bursts * plen].to_vec(),
        meas,
        lost_bursts,
        traffic: lchan.lchan_type.is_traffic(),
    });

    // Later bursts need a fresh block start
    lchan.reset_rx_block();
}

pub fn tx(lchan: &mut Lchan, frame: FrameNumber, bid: u8, tsc: u8, events: &mut EventQueue) -> Option<Vec<UBit>> {
    let desc = lchan.lchan_type.desc();
    let plen = GSM_NBITS_NB_GMSK_PAYLOAD;

    if bid == 0 {
        let prim = lchan.prim.as_ref()?;
        let expected = desc.bursts * plen;
        if prim.bits.len() != expected {
            tracing::error!(
                frame = frame.value(),
                "TS{} {}: primitive carries {} bits, expected {}",
                lchan.tn,
                lchan.lchan_type,
                prim.bits.len(),
                expected
            );
            lchan.prim = None;
            return None;
        }
        lchan.tx_bursts.get_mut(..expected)?.copy_from_slice(&prim.bits);
        lchan.tx_mask = 0;
    } else if lchan.tx_mask == 0 || lchan.prim.is_none() {
        // Nothing started on this block
        return None;
    }

    let offset = bid as usize * plen;
    let burst = build_normal_burst(lchan.tx_bursts.get(offset..offset + plen)?, tsc);
    lchan.tx_mask |= 1 << bid;

    tracing::trace!(frame = frame.value(), "TS{} {} bid={} tx", lchan.tn, lchan.lchan_type, bid);

    if (bid as usize) + 1 == desc.bursts {
        if let Some(prim) = lchan.prim.take() {
            if !prim.filler {
                events.push_back(L1Event::DataCnf {
                    frame,
                    tn: lchan.tn,
                    chan_nr: prim.chan_nr,
                    link_id: prim.link_id,
                });
            }
        }
        lchan.tx_mask = 0;
    }

    Some(burst)
}
