use std::collections::VecDeque;

use trx_core::{FrameNumber, PchanConfig, SoftBit};

use crate::meas::Measurement;

/// Events raised by the scheduler towards its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L1Event {
    /// A block was reassembled on a logical channel
    DataInd {
        /// Frame of the first burst of the block
        frame: FrameNumber,
        tn: u8,
        chan_nr: u8,
        link_id: u8,
        bits: Vec<SoftBit>,
        /// Averaged over the bursts of the block
        meas: Measurement,
        /// Bursts that were substituted because they never arrived
        lost_bursts: usize,
        traffic: bool,
    },
    /// A transmit primitive was sent completely
    DataCnf { frame: FrameNumber, tn: u8, chan_nr: u8, link_id: u8 },
    /// Synchronization burst received
    SchInd { frame: FrameNumber, tn: u8, bits: Vec<SoftBit>, meas: Measurement },
    /// Timeslot configuration changed, the transceiver needs to know
    PchanComb { tn: u8, config: PchanConfig },
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<L1Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: VecDeque::new() }
    }

    pub fn push_back(&mut self, event: L1Event) {
        self.events.push_back(event);
    }

    pub fn pop_front(&mut self) -> Option<L1Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<L1Event> {
        self.events.drain(..).collect()
    }
}
