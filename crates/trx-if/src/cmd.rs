//! Transceiver control commands
//!
//! Commands travel as `CMD <name> [params]`, answered by
//! `RSP <name> <status> [result]`, status 0 meaning success.

use core::fmt;

use trx_core::PchanConfig;
use trx_core::arfcn::BandArfcn;

use crate::CtrlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrxCmd {
    /// Liveness check
    Echo,
    PowerOn,
    PowerOff,
    RxTune { khz: u32 },
    TxTune { khz: u32 },
    SetSlot { tn: u8, code: u8 },
    /// Timing advance in bit periods
    SetTa(i8),
    /// Power measurement on a downlink carrier
    Measure { khz: u32 },
    /// Frequency hopping: HSN, MAIO and the (rx, tx) carrier pairs of the mobile allocation
    SetFh { hsn: u8, maio: u8, freqs: Vec<(u32, u32)> },
}

impl TrxCmd {
    /// Tunes the receiver to the downlink carrier of `arfcn`
    pub fn rx_tune(arfcn: BandArfcn) -> Result<Self, CtrlError> {
        let khz = arfcn.dl_khz().ok_or(CtrlError::InvalidArfcn(arfcn.arfcn))?;
        Ok(TrxCmd::RxTune { khz })
    }

    /// Tunes the transmitter to the uplink carrier of `arfcn`
    pub fn tx_tune(arfcn: BandArfcn) -> Result<Self, CtrlError> {
        let khz = arfcn.ul_khz().ok_or(CtrlError::InvalidArfcn(arfcn.arfcn))?;
        Ok(TrxCmd::TxTune { khz })
    }

    pub fn measure(arfcn: BandArfcn) -> Result<Self, CtrlError> {
        let khz = arfcn.dl_khz().ok_or(CtrlError::InvalidArfcn(arfcn.arfcn))?;
        Ok(TrxCmd::Measure { khz })
    }

    pub fn set_slot(tn: u8, pchan: PchanConfig) -> Self {
        TrxCmd::SetSlot { tn, code: pchan.setslot_code() }
    }

    pub fn set_fh(hsn: u8, maio: u8, ma: &[BandArfcn]) -> Result<Self, CtrlError> {
        if ma.is_empty() {
            return Err(CtrlError::EmptyMobileAllocation);
        }
        let freqs = ma
            .iter()
            .map(|a| match (a.dl_khz(), a.ul_khz()) {
                (Some(rx), Some(tx)) => Ok((rx, tx)),
                _ => Err(CtrlError::InvalidArfcn(a.arfcn)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TrxCmd::SetFh { hsn, maio, freqs })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrxCmd::Echo => "ECHO",
            TrxCmd::PowerOn => "POWERON",
            TrxCmd::PowerOff => "POWEROFF",
            TrxCmd::RxTune { .. } => "RXTUNE",
            TrxCmd::TxTune { .. } => "TXTUNE",
            TrxCmd::SetSlot { .. } => "SETSLOT",
            TrxCmd::SetTa(_) => "SETTA",
            TrxCmd::Measure { .. } => "MEASURE",
            TrxCmd::SetFh { .. } => "SETFH",
        }
    }

    /// Failure of a critical command takes the session down
    pub fn is_critical(&self) -> bool {
        !matches!(self, TrxCmd::SetTa(_))
    }

    fn params(&self) -> Option<String> {
        match self {
            TrxCmd::Echo | TrxCmd::PowerOn | TrxCmd::PowerOff => None,
            TrxCmd::RxTune { khz } | TrxCmd::TxTune { khz } | TrxCmd::Measure { khz } => Some(khz.to_string()),
            TrxCmd::SetSlot { tn, code } => Some(format!("{} {}", tn, code)),
            TrxCmd::SetTa(ta) => Some(ta.to_string()),
            TrxCmd::SetFh { hsn, maio, freqs } => {
                let mut s = format!("{} {}", hsn, maio);
                for (rx, tx) in freqs {
                    s.push_str(&format!(" {} {}", rx, tx));
                }
                Some(s)
            }
        }
    }

    /// Command line as sent on the wire, without terminator
    pub fn to_line(&self) -> String {
        match self.params() {
            Some(p) => format!("CMD {} {}", self.name(), p),
            None => format!("CMD {}", self.name()),
        }
    }
}

impl fmt::Display for TrxCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
