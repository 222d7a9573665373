use trx_config::{FillerPattern, SharedConfig};
use trx_core::burst::{GSM_NBITS_NB_GMSK_BURST, GSM_NBITS_NB_GMSK_PAYLOAD};
use trx_core::{Direction, FrameNumber, PchanConfig, SoftBit, TRX_TS_COUNT, UBit};

use crate::a5::{self, cipher_ul_burst, decipher_dl_burst};
use crate::handlers;
use crate::lchan::{AmrConfig, Lchan, TchMode};
use crate::meas::Measurement;
use crate::mframe::{self, Layout};
use crate::timeslot::Timeslot;
use crate::{EventQueue, L1Event, LchanType, SchedError, TxPrim};

/// Signal level reported for bursts that never arrived
pub const SUBST_RSSI: i8 = -120;

/// Burst received from the transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxBurst {
    pub tn: u8,
    pub frame: FrameNumber,
    /// dBm
    pub rssi: i8,
    /// Time of arrival in 1/256 symbol periods
    pub toa256: i16,
    pub bits: Vec<SoftBit>,
    /// Stands in for a burst that was lost
    pub substituted: bool,
}

impl RxBurst {
    pub fn new(tn: u8, frame: FrameNumber, rssi: i8, toa256: i16, bits: Vec<SoftBit>) -> Self {
        Self { tn, frame, rssi, toa256, bits, substituted: false }
    }

    /// Zeroed burst at minimum signal level
    pub fn substitute(tn: u8, frame: FrameNumber) -> Self {
        Self {
            tn,
            frame,
            rssi: SUBST_RSSI,
            toa256: 0,
            bits: vec![0; GSM_NBITS_NB_GMSK_BURST],
            substituted: true,
        }
    }
}

/// Burst to be sent by the transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBurst {
    pub tn: u8,
    pub frame: FrameNumber,
    pub bits: Vec<UBit>,
}

/// Owns all timeslots and dispatches bursts between them and the transceiver
pub struct Scheduler {
    ts: [Option<Timeslot>; TRX_TS_COUNT],
    /// Frame number of the last clock tick
    current_fn: FrameNumber,
    /// Uplink bursts are pulled this many frames ahead of the clock
    fn_advance: u32,
    tsc: u8,
    filler: FillerPattern,
    /// Gaps beyond this many layout periods are not compensated
    loss_periods: u32,
    events: EventQueue,
}

fn ts_index(tn: u8) -> Result<usize, SchedError> {
    if (tn as usize) < TRX_TS_COUNT { Ok(tn as usize) } else { Err(SchedError::InvalidTimeslot(tn)) }
}

impl Scheduler {
    pub fn new(config: &SharedConfig) -> Self {
        let cfg = config.config();
        tracing::info!(
            "Scheduler: fn_advance {} tsc {} filler {:?}",
            cfg.sched.fn_advance,
            cfg.sched.tsc,
            cfg.sched.filler
        );
        Self {
            ts: Default::default(),
            current_fn: FrameNumber::default(),
            fn_advance: cfg.sched.fn_advance,
            tsc: cfg.sched.tsc,
            filler: cfg.sched.filler,
            loss_periods: cfg.sched.loss_periods,
            events: EventQueue::new(),
        }
    }

    pub fn current_fn(&self) -> FrameNumber {
        self.current_fn
    }

    pub fn fn_advance(&self) -> u32 {
        self.fn_advance
    }

    pub fn timeslot(&self, tn: u8) -> Option<&Timeslot> {
        self.ts.get(tn as usize)?.as_ref()
    }

    fn timeslot_mut(&mut self, tn: u8) -> Result<&mut Timeslot, SchedError> {
        let idx = ts_index(tn)?;
        self.ts[idx].as_mut().ok_or(SchedError::TimeslotNotConfigured(tn))
    }

    pub fn lchan(&self, tn: u8, lchan_type: LchanType) -> Option<&Lchan> {
        self.timeslot(tn)?.lchan(lchan_type)
    }

    fn lchan_mut(&mut self, tn: u8, lchan_type: LchanType) -> Result<&mut Lchan, SchedError> {
        self.timeslot_mut(tn)?.lchan_mut_or_err(lchan_type)
    }

    pub fn pop_event(&mut self) -> Option<L1Event> {
        self.events.pop_front()
    }

    pub fn drain_events(&mut self) -> Vec<L1Event> {
        self.events.drain()
    }

    /// (Re)configures a timeslot. On failure any previous configuration stays in place.
    pub fn configure(&mut self, tn: u8, config: PchanConfig) -> Result<(), SchedError> {
        let idx = ts_index(tn)?;
        let layout = mframe::lookup(config, tn).ok_or(SchedError::ConfigNotSupported(config, tn))?;

        if let Some(old) = self.ts[idx].take() {
            tracing::debug!("TS{} reconfiguring from {} to {}", tn, old.layout.name, layout.name);
        }
        let ts = Timeslot::new(tn, layout);
        tracing::info!("TS{} configured as {} ({} lchans, {} active)", tn, layout.name, ts.lchans.len(), ts.active_lchans().count());
        self.ts[idx] = Some(ts);

        self.events.push_back(L1Event::PchanComb { tn, config });
        Ok(())
    }

    /// Tears a timeslot down. Unconfigured timeslots are left alone.
    pub fn deconfigure(&mut self, tn: u8) -> Result<(), SchedError> {
        let idx = ts_index(tn)?;
        let Some(mut ts) = self.ts[idx].take() else {
            return Ok(());
        };

        ts.flush();
        for lchan in ts.lchans.iter_mut() {
            lchan.reset_state();
        }
        tracing::info!("TS{} deconfigured", tn);

        self.events.push_back(L1Event::PchanComb { tn, config: PchanConfig::None });
        Ok(())
    }

    /// Tears down all timeslots
    pub fn reset(&mut self) {
        for tn in 0..TRX_TS_COUNT as u8 {
            // Index is always valid
            let _ = self.deconfigure(tn);
        }
        self.current_fn = FrameNumber::default();
    }

    pub fn activate(&mut self, tn: u8, lchan_type: LchanType) -> Result<(), SchedError> {
        self.lchan_mut(tn, lchan_type)?.activate()
    }

    pub fn deactivate(&mut self, tn: u8, lchan_type: LchanType) -> Result<(), SchedError> {
        self.lchan_mut(tn, lchan_type)?.deactivate()
    }

    /// Activates or deactivates every channel addressed by `chan_nr`, a dedicated
    /// channel and its SACCH alike. Channels already in the requested state are skipped.
    pub fn set_lchans(&mut self, tn: u8, chan_nr: u8, active: bool, tch_mode: TchMode) -> Result<(), SchedError> {
        let ts = self.timeslot_mut(tn)?;
        let mut found = false;

        for lchan in ts.lchans.iter_mut() {
            if lchan.lchan_type.desc().chan_nr != (chan_nr & 0xf8) {
                continue;
            }
            found = true;
            if active {
                if !lchan.active {
                    lchan.activate()?;
                }
                lchan.tch_mode = tch_mode;
            } else if lchan.active {
                lchan.deactivate()?;
            }
        }

        if !found {
            return Err(SchedError::ChanNrNotFound { tn, chan_nr });
        }
        Ok(())
    }

    /// Enables A5/`algo` on the active dedicated channels of a timeslot
    pub fn set_ciphering(&mut self, tn: u8, algo: u8, key: &[u8]) -> Result<(), SchedError> {
        a5::check_key(algo, key)?;
        let ts = self.timeslot_mut(tn)?;
        for lchan in ts.lchans.iter_mut().filter(|l| l.active && l.lchan_type.is_cbtx()) {
            lchan.set_ciphering(algo, key)?;
            tracing::debug!("TS{} {}: ciphering A5/{}", tn, lchan.lchan_type, algo);
        }
        Ok(())
    }

    pub fn set_tch_mode(&mut self, tn: u8, lchan_type: LchanType, mode: TchMode) -> Result<(), SchedError> {
        if !lchan_type.is_traffic() {
            return Err(SchedError::NotTrafficChannel(lchan_type));
        }
        self.lchan_mut(tn, lchan_type)?.tch_mode = mode;
        Ok(())
    }

    pub fn set_amr_cfg(&mut self, tn: u8, lchan_type: LchanType, codecs: u8, start_codec: u8) -> Result<(), SchedError> {
        if !lchan_type.is_traffic() {
            return Err(SchedError::NotTrafficChannel(lchan_type));
        }
        let amr = AmrConfig::new(codecs, start_codec)?;
        self.lchan_mut(tn, lchan_type)?.amr = amr;
        Ok(())
    }

    /// Averages the `n` most recent measurements of a channel
    pub fn meas_average(&self, tn: u8, lchan_type: LchanType, n: usize) -> Result<Measurement, SchedError> {
        let ts = self.timeslot(tn).ok_or(SchedError::TimeslotNotConfigured(tn))?;
        ts.lchan(lchan_type).ok_or(SchedError::LchanNotFound(lchan_type))?.meas.average(n)
    }

    /// Queues a primitive for transmission on a timeslot
    pub fn enqueue_tx(&mut self, tn: u8, prim: TxPrim) -> Result<(), SchedError> {
        let ts = self.timeslot_mut(tn)?;
        tracing::trace!("TS{} enqueue chan_nr=0x{:02x} link_id=0x{:02x}", tn, prim.chan_nr, prim.link_id);
        ts.enqueue(prim);
        Ok(())
    }

    /// Produces the uplink burst of one timeslot for `frame`, if any channel transmits
    pub fn pull(&mut self, frame: FrameNumber, tn: u8) -> Option<TxBurst> {
        let (tsc, filler) = (self.tsc, self.filler);
        let events = &mut self.events;
        let ts = self.ts.get_mut(tn as usize)?.as_mut()?;

        let role = ts.layout.role(frame, Direction::Ul);
        if role.is_idle() {
            return None;
        }
        let lchan_type = role.lchan;
        let lchan = ts.lchan(lchan_type)?;
        if !lchan.active {
            return None;
        }

        // New primitives only start on a block boundary
        if role.bid == 0 && lchan.prim.is_none() {
            let prim = ts.dequeue(lchan_type, frame).or_else(|| {
                lchan_type.is_cbtx().then(|| {
                    let desc = lchan_type.desc();
                    TxPrim::filler(desc.chan_nr | tn, desc.link_id, desc.bursts * GSM_NBITS_NB_GMSK_PAYLOAD, filler)
                })
            });
            ts.lchan_mut(lchan_type)?.prim = prim;
        }

        let lchan = ts.lchan_mut(lchan_type)?;
        let mut bits = handlers::handle_tx(lchan, frame, role.bid, tsc, events)?;
        if let Some(ks) = lchan.keystream(frame) {
            cipher_ul_burst(&mut bits, &ks.ul);
        }

        Some(TxBurst { tn, frame, bits })
    }

    /// Pulls every timeslot for the frame `fn_advance` ahead of the clock tick `clock_fn`
    pub fn pull_frame(&mut self, clock_fn: FrameNumber) -> Vec<TxBurst> {
        self.current_fn = clock_fn;
        let frame = clock_fn.add(self.fn_advance as i32);
        (0..TRX_TS_COUNT as u8).filter_map(|tn| self.pull(frame, tn)).collect()
    }

    /// Feeds a received burst to the channel owning it.
    /// Bursts of unowned or inactive channels are dropped silently.
    pub fn push(&mut self, burst: RxBurst) -> Result<(), SchedError> {
        let tn = burst.tn;
        let loss_periods = self.loss_periods;
        let events = &mut self.events;
        let ts = self
            .ts
            .get_mut(tn as usize)
            .and_then(Option::as_mut)
            .ok_or(SchedError::TimeslotNotConfigured(tn))?;

        let layout = ts.layout;
        let role = layout.role(burst.frame, Direction::Dl);
        if role.is_idle() {
            return Ok(());
        }
        let Some(lchan) = ts.lchan_mut(role.lchan) else {
            return Ok(());
        };
        if !lchan.active {
            return Ok(());
        }

        match substitute_lost(lchan, layout, burst.frame, loss_periods, events) {
            Ok(_) => {}
            Err(e @ SchedError::StaleFrame { .. }) => {
                tracing::debug!(frame = burst.frame.value(), "TS{} {}", tn, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(frame = burst.frame.value(), "TS{} {}, resynchronizing", tn, e);
                // Bursts before the gap cannot complete a block with bursts after it
                lchan.reset_rx_block();
            }
        }

        let mut burst = burst;
        if let Some(ks) = lchan.keystream(burst.frame) {
            decipher_dl_burst(&mut burst.bits, &ks.dl);
        }
        process_rx(lchan, &burst, role.bid, events);

        lchan.tdma.last_proc = burst.frame;
        lchan.tdma.num_proc = lchan.tdma.num_proc.wrapping_add(1);
        if lchan.tdma.num_proc == 0 {
            // Zero means nothing processed yet, keep the loss check armed
            lchan.tdma.num_proc = 1;
        }
        Ok(())
    }

    /// Substitutes the frames a channel lost between its last processed frame and `new_fn`.
    /// Returns the number of substituted frames.
    pub fn substitute_lost(&mut self, tn: u8, lchan_type: LchanType, new_fn: FrameNumber) -> Result<usize, SchedError> {
        let loss_periods = self.loss_periods;
        let events = &mut self.events;
        let idx = ts_index(tn)?;
        let ts = self.ts[idx].as_mut().ok_or(SchedError::TimeslotNotConfigured(tn))?;
        let layout = ts.layout;
        let lchan = ts.lchan_mut_or_err(lchan_type)?;
        substitute_lost(lchan, layout, new_fn, loss_periods, events)
    }
}

fn process_rx(lchan: &mut Lchan, burst: &RxBurst, bid: u8, events: &mut EventQueue) {
    lchan.meas.push(Measurement { frame: burst.frame, toa256: burst.toa256, rssi: burst.rssi });
    handlers::handle_rx(lchan, burst, bid, events);
}

fn substitute_lost(
    lchan: &mut Lchan,
    layout: &Layout,
    new_fn: FrameNumber,
    loss_periods: u32,
    events: &mut EventQueue,
) -> Result<usize, SchedError> {
    // Nothing to compare against yet
    if lchan.tdma.num_proc == 0 {
        return Ok(0);
    }

    let last = lchan.tdma.last_proc;
    let elapsed = new_fn.diff(last);
    if elapsed <= 0 {
        return Err(SchedError::StaleFrame { lchan: lchan.lchan_type, elapsed });
    }
    if elapsed as u32 > layout.period * loss_periods {
        return Err(SchedError::ExcessiveFrameLoss { lchan: lchan.lchan_type, elapsed });
    }

    let mut count = 0;
    for i in 1..elapsed {
        let frame = last.add(i);
        let role = layout.role(frame, Direction::Dl);
        if role.lchan != lchan.lchan_type {
            continue;
        }

        tracing::debug!(frame = frame.value(), "TS{} {}: substituting lost burst bid={}", lchan.tn, lchan.lchan_type, role.bid);
        let dummy = RxBurst::substitute(lchan.tn, frame);
        process_rx(lchan, &dummy, role.bid, events);

        lchan.tdma.last_proc = frame;
        lchan.tdma.num_lost = lchan.tdma.num_lost.wrapping_add(1);
        count += 1;
    }
    Ok(count)
}
