mod common;

use std::time::{Duration, Instant};

use common::{FakeTrx, default_test_config, poll_until};
use trx_core::burst::Modulation;
use trx_core::{FrameNumber, SoftBit, debug};
use trx_if::trxd::{TrxdRxInd, TrxdTxReq};
use trx_if::{CtrlError, SessionEvent, SessionState, TrxCmd};
use trx_l1sched::TxBurst;

#[test]
fn test_session_over_loopback() {
    debug::setup_logging_verbose();
    let fake = FakeTrx::new();
    let mut trx = fake.interface(default_test_config());
    assert_eq!(trx.state(), SessionState::Offline);

    trx.submit(TrxCmd::Echo, Instant::now()).unwrap();
    trx.submit(TrxCmd::PowerOn, Instant::now()).unwrap();

    let (line, peer) = fake.recv_cmd();
    assert_eq!(line, "CMD ECHO");
    fake.respond("RSP ECHO 0", peer);

    // POWERON only goes out once ECHO is answered
    assert_eq!(trx.session().pending(), 2);
    poll_until(&mut trx, |t, _| t.session().pending() == 1);
    let (line, peer) = fake.recv_cmd();
    assert_eq!(line, "CMD POWERON");
    fake.respond("RSP POWERON 0", peer);

    poll_until(&mut trx, |t, _| t.state() == SessionState::Active);
    assert_eq!(trx.state(), SessionState::Active);
    assert_eq!(trx.submit(TrxCmd::PowerOn, Instant::now()), Err(CtrlError::AlreadyPoweredUp));

    trx.close();
    assert_eq!(fake.recv_cmd().0, "CMD POWEROFF");
    assert_eq!(trx.state(), SessionState::Offline);
}

#[test]
fn test_unanswered_command_is_fatal() {
    debug::setup_logging_verbose();
    let fake = FakeTrx::new();
    let mut trx = fake.interface(default_test_config());

    trx.submit(TrxCmd::Echo, Instant::now()).unwrap();
    let events = poll_until(&mut trx, |_, ev| ev.iter().any(|e| matches!(e, SessionEvent::Fatal(_))));
    assert!(matches!(events[..], [SessionEvent::Fatal(_)]));
    assert_eq!(trx.state(), SessionState::Offline);

    // Initial send plus three retries
    for _ in 0..4 {
        assert_eq!(fake.recv_cmd().0, "CMD ECHO");
    }
}

#[test]
fn test_bursts_over_loopback() {
    debug::setup_logging_verbose();
    let fake = FakeTrx::new();
    let mut trx = fake.interface(default_test_config());
    let (_, data_addr) = trx.local_addrs();
    let data_addr = data_addr.unwrap();

    let ind = TrxdRxInd::new(1, FrameNumber::new(51), -75, 12, vec![64; 148]);
    fake.data.send_to(&ind.encode(), data_addr).unwrap();
    // Garbage is dropped
    fake.data.send_to(&[0x09, 0, 0, 0, 0, 0, 0, 0], data_addr).unwrap();

    let start = Instant::now();
    let mut inds = Vec::new();
    while inds.is_empty() && start.elapsed() < Duration::from_secs(1) {
        inds.extend(trx.poll_data());
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(inds, vec![ind]);

    let burst = TxBurst { tn: 1, frame: FrameNumber::new(54), bits: vec![1; 148] };
    trx.tx_burst(&burst).unwrap();
    let req = TrxdTxReq::decode(&fake.recv_data()).unwrap();
    assert_eq!(req.tn, 1);
    assert_eq!(req.frame, FrameNumber::new(54));
    assert_eq!(req.att, 7);
    assert_eq!(req.bits, burst.bits);
}

#[test]
fn test_8psk_burst_over_loopback() {
    debug::setup_logging_verbose();
    let fake = FakeTrx::new();
    let mut trx = fake.interface(default_test_config());
    let (_, data_addr) = trx.local_addrs();
    let data_addr = data_addr.unwrap();

    let bits: Vec<SoftBit> = (0..444).map(|i| (i % 255 - 127) as SoftBit).collect();
    let mut ind = TrxdRxInd::new(6, FrameNumber::new(2_715_647), -93, -40, bits);
    ind.version = 1;
    ind.tsc = 5;
    ind.ci_cb = 130;
    assert_eq!(ind.modulation, Modulation::Psk8);

    let buf = ind.encode();
    assert_eq!(buf.len(), 11 + 444);
    // MTS: 8PSK, TSC 5
    assert_eq!(buf[8], 0b0100 << 3 | 5);
    fake.data.send_to(&buf, data_addr).unwrap();

    let start = Instant::now();
    let mut inds = Vec::new();
    while inds.is_empty() && start.elapsed() < Duration::from_secs(1) {
        inds.extend(trx.poll_data());
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(inds, vec![ind.clone()]);

    let burst = inds.remove(0).into_burst();
    assert_eq!(burst.bits.len(), 444);
    assert_eq!(burst.bits, ind.bits);
    assert!(!burst.substituted);
}
