use trx_core::PchanConfig;

use crate::LchanType;

/// Scheduler errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// No multiframe layout exists for this configuration on this timeslot
    ConfigNotSupported(PchanConfig, u8),
    TimeslotNotConfigured(u8),
    LchanNotFound(LchanType),
    /// No channel of the timeslot answers to this channel number
    ChanNrNotFound { tn: u8, chan_nr: u8 },
    AlreadyActive(LchanType),
    NotActive(LchanType),
    /// Frame is not newer than the last one processed on the channel
    StaleFrame { lchan: LchanType, elapsed: i32 },
    /// More frames went missing than can be compensated for
    ExcessiveFrameLoss { lchan: LchanType, elapsed: i32 },
    InsufficientHistory { requested: usize, available: usize },
    InvalidHistoryWindow(usize),
    KeyTooLong(usize),
    InvalidKeyLength(usize),
    UnsupportedCipher(u8),
    NotTrafficChannel(LchanType),
    InvalidAmrConfig,
    InvalidTimeslot(u8),
}

impl std::fmt::Display for SchedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedError::ConfigNotSupported(config, tn) => {
                write!(f, "Configuration {} not supported on TS{}", config, tn)
            }
            SchedError::TimeslotNotConfigured(tn) => write!(f, "TS{} is not configured", tn),
            SchedError::LchanNotFound(lchan) => write!(f, "Logical channel {} not found", lchan),
            SchedError::ChanNrNotFound { tn, chan_nr } => {
                write!(f, "No logical channel for chan_nr 0x{:02x} on TS{}", chan_nr, tn)
            }
            SchedError::AlreadyActive(lchan) => write!(f, "Logical channel {} is already active", lchan),
            SchedError::NotActive(lchan) => write!(f, "Logical channel {} is not active", lchan),
            SchedError::StaleFrame { lchan, elapsed } => {
                write!(f, "Stale frame on {} (elapsed {})", lchan, elapsed)
            }
            SchedError::ExcessiveFrameLoss { lchan, elapsed } => {
                write!(f, "Too many frames lost on {} (elapsed {})", lchan, elapsed)
            }
            SchedError::InsufficientHistory { requested, available } => write!(
                f,
                "Not enough measurements: requested {}, available {}",
                requested, available
            ),
            SchedError::InvalidHistoryWindow(n) => write!(f, "Invalid measurement window {}", n),
            SchedError::KeyTooLong(len) => write!(f, "Cipher key too long ({} bytes)", len),
            SchedError::InvalidKeyLength(len) => write!(f, "Invalid cipher key length {}", len),
            SchedError::UnsupportedCipher(algo) => write!(f, "Unsupported cipher A5/{}", algo),
            SchedError::NotTrafficChannel(lchan) => write!(f, "{} is not a traffic channel", lchan),
            SchedError::InvalidAmrConfig => write!(f, "Invalid AMR codec configuration"),
            SchedError::InvalidTimeslot(tn) => write!(f, "Invalid timeslot {}", tn),
        }
    }
}

impl std::error::Error for SchedError {}
