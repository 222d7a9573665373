mod common;

use common::{data_inds, hard_burst, scheduler_with, soft_burst};
use trx_core::burst::{GSM_NBITS_NB_GMSK_PAYLOAD, build_normal_burst};
use trx_core::{FrameNumber, PchanConfig, UBit, debug};
use trx_l1sched::a5::{self, cipher_ul_burst};
use trx_l1sched::lchan::TchMode;
use trx_l1sched::{L1Event, LchanType, SchedError, TxPrim};

const KEY: [u8; 8] = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];

#[test]
fn test_lost_bursts_are_substituted() {
    debug::setup_logging_verbose();
    let mut sched = scheduler_with(1, PchanConfig::Sdcch8);
    sched.set_lchans(1, 0x41, true, TchMode::Signalling).unwrap();

    // SDCCH/8(0) owns frames 0..3 and 51..54 of the 102-frame layout
    sched.push(soft_burst(1, 0, 100)).unwrap();
    sched.push(soft_burst(1, 1, 100)).unwrap();
    sched.push(soft_burst(1, 3, 100)).unwrap();

    let lchan = sched.lchan(1, LchanType::Sdcch8_0).unwrap();
    assert_eq!(lchan.tdma.num_lost, 1);
    assert_eq!(lchan.tdma.num_proc, 3);
    assert_eq!(lchan.tdma.last_proc, FrameNumber::new(3));

    let inds = data_inds(sched.drain_events());
    assert_eq!(inds.len(), 1);
    let L1Event::DataInd { frame, chan_nr, lost_bursts, bits, .. } = &inds[0] else {
        panic!("expected DataInd");
    };
    assert_eq!(*frame, FrameNumber::new(0));
    assert_eq!(*chan_nr, 0x41);
    assert_eq!(*lost_bursts, 1);
    // Substituted burst reads as zeros
    assert!(bits[2 * 116..3 * 116].iter().all(|&b| b == 0));
    assert!(bits[3 * 116..].iter().all(|&b| b == 100));

    // Nothing of this channel between 4 and 50
    assert_eq!(sched.substitute_lost(1, LchanType::Sdcch8_0, FrameNumber::new(51)), Ok(0));
    sched.push(soft_burst(1, 51, 100)).unwrap();
    sched.push(soft_burst(1, 102, 100)).unwrap();

    let lchan = sched.lchan(1, LchanType::Sdcch8_0).unwrap();
    assert_eq!(lchan.tdma.num_lost, 4);
    let inds = data_inds(sched.drain_events());
    assert_eq!(inds.len(), 1);
    assert!(matches!(inds[0], L1Event::DataInd { lost_bursts: 3, .. }));
}

#[test]
fn test_stale_and_excessive_frames() {
    debug::setup_logging_verbose();
    let mut sched = scheduler_with(1, PchanConfig::Sdcch8);
    sched.activate(1, LchanType::Sdcch8_0).unwrap();
    sched.push(soft_burst(1, 52, 1)).unwrap();

    let before = sched.lchan(1, LchanType::Sdcch8_0).unwrap().tdma;
    let meas_before = sched.lchan(1, LchanType::Sdcch8_0).unwrap().meas.len();
    assert_eq!(
        sched.push(soft_burst(1, 52, 1)),
        Err(SchedError::StaleFrame { lchan: LchanType::Sdcch8_0, elapsed: 0 })
    );
    assert!(matches!(sched.push(soft_burst(1, 51, 1)), Err(SchedError::StaleFrame { .. })));
    let lchan = sched.lchan(1, LchanType::Sdcch8_0).unwrap();
    assert_eq!(lchan.tdma, before);
    assert_eq!(lchan.meas.len(), meas_before);

    // A gap of more than one layout period is accepted without substitution
    sched.push(soft_burst(1, 52 + 102 * 3 + 1, 1)).unwrap();
    let lchan = sched.lchan(1, LchanType::Sdcch8_0).unwrap();
    assert_eq!(lchan.tdma.num_lost, 0);
    assert_eq!(lchan.tdma.num_proc, 2);
    assert_eq!(lchan.tdma.last_proc, FrameNumber::new(52 + 102 * 3 + 1));
}

#[test]
fn test_bursts_of_inactive_channels_are_ignored() {
    let mut sched = scheduler_with(1, PchanConfig::Sdcch8);
    sched.push(soft_burst(1, 0, 1)).unwrap();
    assert!(sched.drain_events().is_empty());
    assert_eq!(sched.push(soft_burst(2, 0, 1)), Err(SchedError::TimeslotNotConfigured(2)));
}

#[test]
fn test_uplink_block_and_filler() {
    debug::setup_logging_verbose();
    let mut sched = scheduler_with(1, PchanConfig::Sdcch8);
    sched.set_lchans(1, 0x41, true, TchMode::Signalling).unwrap();

    let bits: Vec<UBit> = (0..4 * GSM_NBITS_NB_GMSK_PAYLOAD).map(|i| (i % 3 == 0) as UBit).collect();
    sched.enqueue_tx(1, TxPrim::new(0x41, 0x00, bits.clone())).unwrap();

    // Uplink of SDCCH/8(0) starts at frame 15, pulled 3 frames ahead of the clock
    for (i, clock) in (12..16).enumerate() {
        let bursts = sched.pull_frame(FrameNumber::new(clock));
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].tn, 1);
        assert_eq!(bursts[0].frame, FrameNumber::new(clock + 3));
        let payload = &bits[i * GSM_NBITS_NB_GMSK_PAYLOAD..(i + 1) * GSM_NBITS_NB_GMSK_PAYLOAD];
        assert_eq!(bursts[0].bits, build_normal_burst(payload, 3));
    }
    assert_eq!(sched.current_fn(), FrameNumber::new(15));
    assert_eq!(
        sched.drain_events(),
        vec![L1Event::DataCnf { frame: FrameNumber::new(18), tn: 1, chan_nr: 0x41, link_id: 0x00 }]
    );

    // Uplink of SDCCH/8(1), not active
    assert!(sched.pull_frame(FrameNumber::new(16)).is_empty());

    // Next block of the channel carries filler, never confirmed
    for clock in 63..67 {
        assert_eq!(sched.pull_frame(FrameNumber::new(clock)).len(), 1);
    }
    assert!(sched.drain_events().is_empty());
}

#[test]
fn test_ciphering_on_both_directions() {
    debug::setup_logging_verbose();
    let mut sched = scheduler_with(1, PchanConfig::Sdcch8);
    sched.set_lchans(1, 0x41, true, TchMode::Signalling).unwrap();
    sched.set_ciphering(1, 1, &KEY).unwrap();

    // Uplink: the rendered burst is enciphered with the uplink keystream
    let bits = vec![1 as UBit; 4 * GSM_NBITS_NB_GMSK_PAYLOAD];
    sched.enqueue_tx(1, TxPrim::new(0x41, 0x00, bits.clone())).unwrap();
    let frame = FrameNumber::new(15);
    let burst = sched.pull(frame, 1).unwrap();
    let mut expected = build_normal_burst(&bits[..GSM_NBITS_NB_GMSK_PAYLOAD], 3);
    cipher_ul_burst(&mut expected, &a5::keystream(1, &KEY, frame).unwrap().ul);
    assert_eq!(burst.bits, expected);

    // Downlink: enciphered bursts come out in clear text
    let plain: Vec<UBit> = (0..148).map(|i| (i % 2) as UBit).collect();
    for f in 0..4u32 {
        let mut ciphered = plain.clone();
        cipher_ul_burst(&mut ciphered, &a5::keystream(1, &KEY, FrameNumber::new(f)).unwrap().dl);
        sched.push(hard_burst(1, f, &ciphered)).unwrap();
    }
    let inds = data_inds(sched.drain_events());
    let L1Event::DataInd { bits, lost_bursts: 0, .. } = &inds[0] else {
        panic!("expected complete DataInd");
    };
    let expected = hard_burst(1, 0, &plain).bits;
    assert_eq!(&bits[..58], &expected[3..61]);
    assert_eq!(&bits[58..116], &expected[87..145]);
}

#[test]
fn test_rach_and_common_channels() {
    debug::setup_logging_verbose();
    let mut sched = scheduler_with(0, PchanConfig::Ccch);

    // Every uplink frame of a CCCH timeslot belongs to RACH, silent without a request
    assert!(sched.pull(FrameNumber::new(7), 0).is_none());
    sched.enqueue_tx(0, TxPrim::new(0x88, 0x00, vec![1; 36])).unwrap();
    let burst = sched.pull(FrameNumber::new(8), 0).unwrap();
    assert_eq!(burst.bits.len(), 148);
    assert_eq!(
        sched.drain_events(),
        vec![L1Event::DataCnf { frame: FrameNumber::new(8), tn: 0, chan_nr: 0x88, link_id: 0x00 }]
    );

    // BCCH block at frames 2..5
    for f in 2..6 {
        sched.push(soft_burst(0, f, -50)).unwrap();
    }
    let inds = data_inds(sched.drain_events());
    assert!(matches!(inds[..], [L1Event::DataInd { chan_nr: 0x80, lost_bursts: 0, .. }]));

    let avg = sched.meas_average(0, LchanType::Bcch, 4).unwrap();
    assert_eq!(avg.rssi, -60);
    assert_eq!(avg.toa256, 128);
    assert_eq!(avg.frame, FrameNumber::new(2));
    assert!(sched.meas_average(0, LchanType::Bcch, 5).is_err());
}

#[test]
fn test_block_realigns_after_excessive_loss() {
    debug::setup_logging_verbose();
    let mut sched = scheduler_with(1, PchanConfig::Sdcch8);
    sched.set_lchans(1, 0x41, true, TchMode::Signalling).unwrap();

    for f in 0..4 {
        sched.push(soft_burst(1, f, 100)).unwrap();
    }
    assert_eq!(data_inds(sched.drain_events()).len(), 1);

    // Three periods later, the start of the block is missing
    for f in 307..310 {
        sched.push(soft_burst(1, f, -5)).unwrap();
    }
    assert!(data_inds(sched.drain_events()).is_empty());

    // Next block start realigns reassembly
    for f in 357..361 {
        sched.push(soft_burst(1, f, -5)).unwrap();
    }
    let inds = data_inds(sched.drain_events());
    assert_eq!(inds.len(), 1);
    let L1Event::DataInd { frame, lost_bursts, bits, .. } = &inds[0] else {
        panic!("expected DataInd");
    };
    assert_eq!(*frame, FrameNumber::new(357));
    assert_eq!(*lost_bursts, 0);
    assert!(bits.iter().all(|&b| b == -5));

    // A half block before an outage is not completed by bursts after it
    sched.push(soft_burst(1, 408, 100)).unwrap();
    sched.push(soft_burst(1, 409, 100)).unwrap();
    sched.push(soft_burst(1, 408 + 204 + 2, -5)).unwrap();
    sched.push(soft_burst(1, 408 + 204 + 3, -5)).unwrap();
    assert!(data_inds(sched.drain_events()).is_empty());
}

#[test]
fn test_uplink_channels_share_timeslot() {
    debug::setup_logging_verbose();
    let mut sched = scheduler_with(1, PchanConfig::Sdcch8);
    sched.set_lchans(1, 0x41, true, TchMode::Signalling).unwrap();
    sched.set_lchans(1, 0x49, true, TchMode::Signalling).unwrap();

    // SDCCH/8(0) queued twice ahead of SDCCH/8(1)
    let block = |b: UBit| vec![b; 4 * GSM_NBITS_NB_GMSK_PAYLOAD];
    sched.enqueue_tx(1, TxPrim::new(0x41, 0x00, block(0))).unwrap();
    sched.enqueue_tx(1, TxPrim::new(0x41, 0x00, block(0))).unwrap();
    sched.enqueue_tx(1, TxPrim::new(0x49, 0x00, block(1))).unwrap();

    // Uplink of SDCCH/8(0) at 15..18, of SDCCH/8(1) at 19..22
    for f in 15..23 {
        assert!(sched.pull(FrameNumber::new(f), 1).is_some());
    }
    assert_eq!(
        sched.drain_events(),
        vec![
            L1Event::DataCnf { frame: FrameNumber::new(18), tn: 1, chan_nr: 0x41, link_id: 0x00 },
            L1Event::DataCnf { frame: FrameNumber::new(22), tn: 1, chan_nr: 0x49, link_id: 0x00 },
        ]
    );

    let ts = sched.timeslot(1).unwrap();
    assert_eq!(ts.tx_queue.len(), 1);
    assert_eq!(ts.tx_queue[0].chan_nr, 0x41);
    let served = ts.rr_cursor.map(|i| ts.lchans[i].lchan_type);
    assert_eq!(served, Some(LchanType::Sdcch8_1));
}
