use trx_core::{FrameNumber, SoftBit, UBit};

use crate::a5::{self, Keystream};
use crate::meas::MeasHistory;
use crate::{LchanType, SchedError, TxPrim};

/// Speech or data mode of a traffic channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TchMode {
    #[default]
    Signalling,
    SpeechV1,
    SpeechEfr,
    SpeechAmr,
}

/// Active codec set of an AMR traffic channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmrConfig {
    /// Bit n set if AMR mode n is part of the active set
    pub codecs: u8,
    /// Index into the active set
    pub start_codec: u8,
}

impl AmrConfig {
    pub fn new(codecs: u8, start_codec: u8) -> Result<Self, SchedError> {
        let count = codecs.count_ones() as u8;
        if count == 0 || start_codec >= count {
            return Err(SchedError::InvalidAmrConfig);
        }
        Ok(Self { codecs, start_codec })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherState {
    pub algo: u8,
    pub key: Vec<u8>,
}

impl CipherState {
    pub fn enabled(&self) -> bool {
        self.algo != 0
    }
}

/// TDMA continuity counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TdmaStats {
    pub last_proc: FrameNumber,
    /// Frames processed, substituted ones excluded
    pub num_proc: u32,
    /// Frames substituted because they never arrived
    pub num_lost: u32,
}

/// Runtime state of one logical channel on a timeslot
#[derive(Debug)]
pub struct Lchan {
    pub lchan_type: LchanType,
    /// Owning timeslot
    pub tn: u8,
    pub active: bool,

    /// Receive burst assembly, allocated only while active
    pub rx_bursts: Vec<SoftBit>,
    pub rx_mask: u8,
    /// Payload bits per burst of the block being assembled
    pub rx_burst_len: usize,
    pub rx_first_fn: FrameNumber,

    /// Transmit burst buffer, allocated only while active
    pub tx_bursts: Vec<UBit>,
    pub tx_mask: u8,
    /// Primitive currently being transmitted
    pub prim: Option<TxPrim>,

    pub tdma: TdmaStats,
    pub a5: CipherState,
    pub tch_mode: TchMode,
    pub amr: AmrConfig,
    pub meas: MeasHistory,
}

impl Lchan {
    pub fn new(lchan_type: LchanType, tn: u8) -> Self {
        Self {
            lchan_type,
            tn,
            active: false,
            rx_bursts: Vec::new(),
            rx_mask: 0,
            rx_burst_len: 0,
            rx_first_fn: FrameNumber::default(),
            tx_bursts: Vec::new(),
            tx_mask: 0,
            prim: None,
            tdma: TdmaStats::default(),
            a5: CipherState::default(),
            tch_mode: TchMode::default(),
            amr: AmrConfig::default(),
            meas: MeasHistory::new(),
        }
    }

    /// RSL channel number of this channel on its timeslot
    pub fn chan_nr(&self) -> u8 {
        self.lchan_type.desc().chan_nr | self.tn
    }

    pub fn link_id(&self) -> u8 {
        self.lchan_type.desc().link_id
    }

    pub fn activate(&mut self) -> Result<(), SchedError> {
        if self.active {
            return Err(SchedError::AlreadyActive(self.lchan_type));
        }
        let size = self.lchan_type.desc().burst_buf_size;
        self.rx_bursts = vec![0; size];
        self.tx_bursts = vec![0; size];
        self.rx_mask = 0;
        self.tx_mask = 0;
        self.tdma = TdmaStats::default();
        self.meas.clear();
        self.active = true;

        tracing::debug!("TS{} activated {}", self.tn, self.lchan_type);
        Ok(())
    }

    pub fn deactivate(&mut self) -> Result<(), SchedError> {
        if !self.active {
            return Err(SchedError::NotActive(self.lchan_type));
        }
        self.reset_state();
        tracing::debug!("TS{} deactivated {}", self.tn, self.lchan_type);
        Ok(())
    }

    /// Forgets the receive block being assembled, the next one starts at bid 0
    pub fn reset_rx_block(&mut self) {
        self.rx_mask = 0;
        self.rx_burst_len = 0;
        self.rx_first_fn = FrameNumber::default();
    }

    /// Frees buffers and returns everything but the channel identity to defaults
    pub(crate) fn reset_state(&mut self) {
        *self = Lchan::new(self.lchan_type, self.tn);
    }

    pub fn set_ciphering(&mut self, algo: u8, key: &[u8]) -> Result<(), SchedError> {
        a5::check_key(algo, key)?;
        self.a5 = CipherState { algo, key: key.to_vec() };
        Ok(())
    }

    /// Keystream for `frame`, None if ciphering is disabled
    pub fn keystream(&self, frame: FrameNumber) -> Option<Keystream> {
        if !self.a5.enabled() {
            return None;
        }
        match a5::keystream(self.a5.algo, &self.a5.key, frame) {
            Ok(ks) => Some(ks),
            Err(e) => {
                tracing::error!("TS{} {}: cannot generate keystream: {}", self.tn, self.lchan_type, e);
                None
            }
        }
    }
}
