use std::collections::VecDeque;

use trx_core::FrameNumber;

use crate::lchan::Lchan;
use crate::mframe::Layout;
use crate::{LchanType, SchedError, TxPrim};

/// FACCH may only start on these 26-multiframe positions of TCH/H(0) and TCH/H(1)
const TCHH_FACCH_STARTS: [[u32; 3]; 2] = [[0, 8, 17], [1, 9, 18]];

/// Timeslot state: its layout, the channels the layout hosts and the transmit queue
#[derive(Debug)]
pub struct Timeslot {
    pub tn: u8,
    pub layout: &'static Layout,
    pub lchans: Vec<Lchan>,
    pub tx_queue: VecDeque<TxPrim>,
    /// Index into `lchans` of the channel that took a primitive last.
    /// Each uplink frame has a single owner, so queued primitives of one
    /// channel never hold back another one.
    pub rr_cursor: Option<usize>,
}

impl Timeslot {
    /// Allocates a channel for every type of the layout, activating the automatic ones
    pub fn new(tn: u8, layout: &'static Layout) -> Self {
        let mut lchans: Vec<Lchan> = layout.lchans().map(|t| Lchan::new(t, tn)).collect();
        for lchan in lchans.iter_mut().filter(|l| l.lchan_type.is_auto()) {
            // Freshly created, cannot be active yet
            let _ = lchan.activate();
        }
        Self { tn, layout, lchans, tx_queue: VecDeque::new(), rr_cursor: None }
    }

    pub fn lchan(&self, lchan_type: LchanType) -> Option<&Lchan> {
        self.lchans.iter().find(|l| l.lchan_type == lchan_type)
    }

    pub fn lchan_mut(&mut self, lchan_type: LchanType) -> Option<&mut Lchan> {
        self.lchans.iter_mut().find(|l| l.lchan_type == lchan_type)
    }

    pub fn lchan_mut_or_err(&mut self, lchan_type: LchanType) -> Result<&mut Lchan, SchedError> {
        self.lchan_mut(lchan_type).ok_or(SchedError::LchanNotFound(lchan_type))
    }

    pub fn active_lchans(&self) -> impl Iterator<Item = &Lchan> {
        self.lchans.iter().filter(|l| l.active)
    }

    pub fn enqueue(&mut self, prim: TxPrim) {
        self.tx_queue.push_back(prim);
    }

    /// Drops all queued primitives
    pub fn flush(&mut self) {
        if !self.tx_queue.is_empty() {
            tracing::debug!("TS{} flushing {} queued primitives", self.tn, self.tx_queue.len());
        }
        self.tx_queue.clear();
        self.rr_cursor = None;
    }

    /// Takes the next primitive for `lchan_type` out of the queue
    pub fn dequeue(&mut self, lchan_type: LchanType, frame: FrameNumber) -> Option<TxPrim> {
        let desc = lchan_type.desc();
        let matching = |p: &TxPrim| lchan_type.matches(p.chan_nr, p.link_id) && (p.chan_nr & 0x07) == self.tn;

        let idx = match lchan_type {
            LchanType::TchF => {
                // Signalling takes precedence over speech
                let facch = self.tx_queue.iter().position(|p| matching(p) && p.facch);
                facch.or_else(|| self.tx_queue.iter().position(|p| matching(p)))
            }
            LchanType::TchH0 | LchanType::TchH1 => {
                let sub = (desc.chan_nr >> 3) as usize & 1;
                if TCHH_FACCH_STARTS[sub].contains(&frame.t2()) {
                    let facch = self.tx_queue.iter().position(|p| matching(p) && p.facch);
                    facch.or_else(|| self.tx_queue.iter().position(|p| matching(p)))
                } else {
                    self.tx_queue.iter().position(|p| matching(p) && !p.facch)
                }
            }
            _ => self.tx_queue.iter().position(|p| matching(p)),
        };

        let prim = self.tx_queue.remove(idx?)?;
        self.rr_cursor = self.lchans.iter().position(|l| l.lchan_type == lchan_type);
        Some(prim)
    }
}
