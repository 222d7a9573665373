use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use trx_core::PchanConfig;
use trx_core::arfcn::BandArfcn;

/// Pattern used to fill blocks on channels requiring continuous transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FillerPattern {
    Zeros,
    Random,
}

/// Transceiver interface endpoints
#[derive(Debug, Clone)]
pub struct CfgTrxIf {
    pub local_host: String,
    pub remote_host: String,
    /// Control binds base+101 and talks to base+1, data binds base+102 and talks to base+2
    pub base_port: u16,
    /// TRXD header version, 0 or 1
    pub trxd_version: u8,
}

impl Default for CfgTrxIf {
    fn default() -> Self {
        Self {
            local_host: "127.0.0.1".to_string(),
            remote_host: "127.0.0.1".to_string(),
            base_port: 6700,
            trxd_version: 0,
        }
    }
}

impl CfgTrxIf {
    pub fn ctrl_local(&self) -> String {
        format!("{}:{}", self.local_host, self.base_port + 101)
    }
    pub fn ctrl_remote(&self) -> String {
        format!("{}:{}", self.remote_host, self.base_port + 1)
    }
    pub fn data_local(&self) -> String {
        format!("{}:{}", self.local_host, self.base_port + 102)
    }
    pub fn data_remote(&self) -> String {
        format!("{}:{}", self.remote_host, self.base_port + 2)
    }
}

/// Control session timing
#[derive(Debug, Clone)]
pub struct CfgCtrl {
    pub rsp_timeout_ms: u64,
    /// Resends of an unanswered command before it is given up
    pub retry_limit: u32,
}

impl Default for CfgCtrl {
    fn default() -> Self {
        Self { rsp_timeout_ms: 2000, retry_limit: 3 }
    }
}

impl CfgCtrl {
    pub fn rsp_timeout(&self) -> Duration {
        Duration::from_millis(self.rsp_timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub struct CfgScheduler {
    /// Frames between the clock and the frame an uplink burst is pulled for
    pub fn_advance: u32,
    /// Training sequence code for normal bursts
    pub tsc: u8,
    pub filler: FillerPattern,
    /// Frame loss beyond this many layout periods is reported instead of compensated
    pub loss_periods: u32,
}

impl Default for CfgScheduler {
    fn default() -> Self {
        Self {
            fn_advance: 3,
            tsc: 0,
            filler: FillerPattern::Zeros,
            loss_periods: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CfgClock {
    /// Clock indications deviating more than this re-lock the frame counter
    pub max_fn_skew: u32,
    /// Frames without an indication before the clock is considered lost
    pub loss_frames: u32,
}

impl Default for CfgClock {
    fn default() -> Self {
        Self { max_fn_skew: 50, loss_frames: 400 }
    }
}

#[derive(Debug, Clone)]
pub struct CfgHopping {
    pub hsn: u8,
    pub maio: u8,
    /// Mobile allocation, list of ARFCNs
    pub ma: Vec<u16>,
}

#[derive(Debug, Clone, Copy)]
pub struct CfgTimeslot {
    pub tn: u8,
    pub pchan: PchanConfig,
}

#[derive(Debug, Clone)]
pub struct CfgRadio {
    pub band_arfcn: u16,
    /// ARFCN belongs to PCS1900 rather than DCS1800
    pub pcs: bool,
    pub ta: i8,
    /// Transmit attenuation in dB, sent with every uplink burst
    pub power_attenuation: u8,
    pub hopping: Option<CfgHopping>,
    pub timeslots: Vec<CfgTimeslot>,
}

impl CfgRadio {
    pub fn arfcn(&self) -> BandArfcn {
        BandArfcn::new(self.band_arfcn, self.pcs)
    }
}

#[derive(Debug, Clone)]
pub struct StackConfig {
    pub debug_log: Option<String>,

    pub trx: CfgTrxIf,
    pub ctrl: CfgCtrl,
    pub sched: CfgScheduler,
    pub clock: CfgClock,

    /// Radio settings are REQUIRED - no default carrier is assumed
    pub radio: CfgRadio,
}

impl StackConfig {
    pub fn new(band_arfcn: u16) -> Self {
        StackConfig {
            debug_log: None,
            trx: CfgTrxIf::default(),
            ctrl: CfgCtrl::default(),
            sched: CfgScheduler::default(),
            clock: CfgClock::default(),
            radio: CfgRadio {
                band_arfcn,
                pcs: false,
                ta: 0,
                power_attenuation: 0,
                hopping: None,
                timeslots: vec![CfgTimeslot { tn: 0, pchan: PchanConfig::Ccch }],
            },
        }
    }

    /// Validate that all required configuration fields are properly set.
    pub fn validate(&self) -> Result<(), &str> {
        if self.trx.trxd_version > 1 {
            return Err("trx.trxd_version must be 0 or 1");
        }
        if self.trx.base_port > u16::MAX - 102 {
            return Err("trx.base_port leaves no room for control/data ports");
        }
        if self.ctrl.rsp_timeout_ms == 0 {
            return Err("ctrl.rsp_timeout_ms must be non-zero");
        }
        if self.sched.tsc > 7 {
            return Err("sched.tsc must be in range 0..7");
        }
        if self.sched.loss_periods == 0 {
            return Err("sched.loss_periods must be at least 1");
        }
        if self.sched.fn_advance > 51 {
            return Err("sched.fn_advance is unreasonably large");
        }

        // Both directions must map to a carrier
        if self.radio.arfcn().dl_khz().is_none() {
            return Err("radio.band_arfcn does not map to a known band");
        }
        if let Some(ref hopping) = self.radio.hopping {
            if hopping.ma.is_empty() {
                return Err("radio.hopping.ma must not be empty");
            }
            if hopping.hsn > 63 {
                return Err("radio.hopping.hsn must be in range 0..63");
            }
            if hopping.ma.iter().any(|&n| BandArfcn::new(n, self.radio.pcs).dl_khz().is_none()) {
                return Err("radio.hopping.ma contains an unmappable ARFCN");
            }
        }

        let mut seen = [false; trx_core::TRX_TS_COUNT];
        for ts in &self.radio.timeslots {
            let Some(slot) = seen.get_mut(ts.tn as usize) else {
                return Err("radio.timeslots: tn must be in range 0..7");
            };
            if *slot {
                return Err("radio.timeslots: duplicate tn");
            }
            *slot = true;
        }

        Ok(())
    }
}

/// Global shared configuration, immutable after construction.
#[derive(Clone)]
pub struct SharedConfig {
    cfg: Arc<StackConfig>,
}

impl SharedConfig {
    pub fn new(band_arfcn: u16) -> Self {
        Self::from_config(StackConfig::new(band_arfcn))
    }

    pub fn from_config(cfg: StackConfig) -> Self {
        // Check config for validity before returning the SharedConfig object
        match cfg.validate() {
            Ok(_) => {}
            Err(e) => panic!("Invalid stack configuration: {}", e),
        }

        Self { cfg: Arc::new(cfg) }
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<StackConfig> {
        Arc::clone(&self.cfg)
    }
}
