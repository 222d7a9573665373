#![allow(dead_code)]

use trx_config::{SharedConfig, StackConfig};
use trx_core::burst::ubit_to_sbit;
use trx_core::{FrameNumber, PchanConfig, SoftBit, UBit};
use trx_l1sched::{L1Event, RxBurst, Scheduler};

/// Creates a default config for testing. It can still be modified as needed
/// before building the scheduler from it
pub fn default_test_config() -> StackConfig {
    let mut cfg = StackConfig::new(42);
    cfg.sched.tsc = 3;
    cfg
}

/// Scheduler with a single timeslot configured
pub fn scheduler_with(tn: u8, pchan: PchanConfig) -> Scheduler {
    let mut sched = Scheduler::new(&SharedConfig::from_config(default_test_config()));
    sched.configure(tn, pchan).unwrap();
    // Drop the configuration event
    sched.drain_events();
    sched
}

/// Normal burst carrying `fill` in every position, as soft bits
pub fn soft_burst(tn: u8, f: u32, fill: SoftBit) -> RxBurst {
    RxBurst::new(tn, FrameNumber::new(f), -60, 128, vec![fill; 148])
}

/// Normal burst of hard bits, converted to soft bits
pub fn hard_burst(tn: u8, f: u32, bits: &[UBit]) -> RxBurst {
    RxBurst::new(tn, FrameNumber::new(f), -60, 0, bits.iter().map(|&b| ubit_to_sbit(b)).collect())
}

/// Splits events into data indications and everything else
pub fn data_inds(events: Vec<L1Event>) -> Vec<L1Event> {
    events.into_iter().filter(|e| matches!(e, L1Event::DataInd { .. })).collect()
}
