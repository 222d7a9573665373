use core::fmt;
use serde::Deserialize;

/// Physical channel configuration of a timeslot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PchanConfig {
    None,
    /// FCCH + SCH + BCCH + CCCH
    Ccch,
    /// FCCH + SCH + BCCH + CCCH + SDCCH/4 + SACCH/4
    CcchSdcch4,
    /// As CcchSdcch4, with the third SDCCH/4 sub-channel carrying CBCH
    CcchSdcch4Cbch,
    /// SDCCH/8 + SACCH/8
    Sdcch8,
    /// As Sdcch8, with the third SDCCH/8 sub-channel carrying CBCH
    Sdcch8Cbch,
    TchF,
    TchH,
    Pdch,
}

impl PchanConfig {
    pub const ALL: [PchanConfig; 9] = [
        PchanConfig::None,
        PchanConfig::Ccch,
        PchanConfig::CcchSdcch4,
        PchanConfig::CcchSdcch4Cbch,
        PchanConfig::Sdcch8,
        PchanConfig::Sdcch8Cbch,
        PchanConfig::TchF,
        PchanConfig::TchH,
        PchanConfig::Pdch,
    ];

    /// Channel combination code used by the transceiver SETSLOT command.
    /// Numbered after the combinations I..XIII of 3GPP TS 45.002 clause 6.4.1,
    /// as in the transceiver's `ChannelCombination` enum (0 = unused slot).
    pub fn setslot_code(self) -> u8 {
        match self {
            PchanConfig::None => 0,
            PchanConfig::TchF => 1,
            PchanConfig::TchH => 3,
            PchanConfig::Ccch => 4,
            PchanConfig::CcchSdcch4 | PchanConfig::CcchSdcch4Cbch => 5,
            PchanConfig::Sdcch8 | PchanConfig::Sdcch8Cbch => 7,
            PchanConfig::Pdch => 13,
        }
    }
}

impl fmt::Display for PchanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PchanConfig::None => "NONE",
            PchanConfig::Ccch => "CCCH",
            PchanConfig::CcchSdcch4 => "CCCH+SDCCH4",
            PchanConfig::CcchSdcch4Cbch => "CCCH+SDCCH4+CBCH",
            PchanConfig::Sdcch8 => "SDCCH8",
            PchanConfig::Sdcch8Cbch => "SDCCH8+CBCH",
            PchanConfig::TchF => "TCH/F",
            PchanConfig::TchH => "TCH/H",
            PchanConfig::Pdch => "PDCH",
        };
        write!(f, "{}", name)
    }
}
