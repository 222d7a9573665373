/// TRXD datagram decoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrxdError {
    TooShort { len: usize, needed: usize },
    UnsupportedVersion(u8),
    /// Burst length fits no known modulation
    BadBurstLength(usize),
    UnsupportedModulation(u8),
    IllegalTimeslot(u8),
    IllegalFrameNumber(u32),
}

impl std::fmt::Display for TrxdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrxdError::TooShort { len, needed } => {
                write!(f, "Datagram too short: {} bytes, need {}", len, needed)
            }
            TrxdError::UnsupportedVersion(ver) => write!(f, "Unsupported TRXD version {}", ver),
            TrxdError::BadBurstLength(len) => write!(f, "Unexpected burst length {}", len),
            TrxdError::UnsupportedModulation(m) => write!(f, "Unsupported modulation 0x{:x}", m),
            TrxdError::IllegalTimeslot(tn) => write!(f, "Illegal TS {}", tn),
            TrxdError::IllegalFrameNumber(fn_) => write!(f, "Illegal FN {}", fn_),
        }
    }
}

impl std::error::Error for TrxdError {}

/// Control command and session errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtrlError {
    EmptyMobileAllocation,
    AlreadyPoweredUp,
    MalformedResponse(String),
    /// ARFCN maps to no known band
    InvalidArfcn(u16),
}

impl std::fmt::Display for CtrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CtrlError::EmptyMobileAllocation => write!(f, "Mobile allocation is empty"),
            CtrlError::AlreadyPoweredUp => write!(f, "Transceiver is already powered up"),
            CtrlError::MalformedResponse(rsp) => write!(f, "Malformed response '{}'", rsp),
            CtrlError::InvalidArfcn(arfcn) => write!(f, "ARFCN {} not defined", arfcn),
        }
    }
}

impl std::error::Error for CtrlError {}
