//! Logical channel catalogue, one static descriptor per channel type

use core::fmt;

use trx_core::burst::{GSM_NBITS_NB_8PSK_PAYLOAD, GSM_NBITS_NB_GMSK_PAYLOAD};

/// Logical channel types. The discriminant is the bit position in a layout's channel mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LchanType {
    Idle = 0,
    Fcch,
    Sch,
    Bcch,
    Rach,
    Ccch,
    TchF,
    TchH0,
    TchH1,
    Sdcch4_0,
    Sdcch4_1,
    Sdcch4_2,
    Sdcch4_3,
    Sdcch8_0,
    Sdcch8_1,
    Sdcch8_2,
    Sdcch8_3,
    Sdcch8_4,
    Sdcch8_5,
    Sdcch8_6,
    Sdcch8_7,
    SacchTf,
    SacchTh0,
    SacchTh1,
    Sacch4_0,
    Sacch4_1,
    Sacch4_2,
    Sacch4_3,
    Sacch8_0,
    Sacch8_1,
    Sacch8_2,
    Sacch8_3,
    Sacch8_4,
    Sacch8_5,
    Sacch8_6,
    Sacch8_7,
    Pdtch,
    Ptcch,
    Sdcch4Cbch,
    Sdcch8Cbch,
}

/// Activated as soon as the timeslot is configured
pub const LCHAN_FLAG_AUTO: u8 = 1 << 0;
/// Transmits continuously, idle blocks are filled in
pub const LCHAN_FLAG_CBTX: u8 = 1 << 1;
/// Packet data channel
pub const LCHAN_FLAG_PDCH: u8 = 1 << 2;

/// RSL link identifier of the slow associated control channel
pub const LINK_ID_SACCH: u8 = 0x40;

/// How bursts of a channel are turned into blocks and back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Bursts are discarded (FCCH, idle frames)
    None,
    /// Multi-burst blocks of normal bursts
    Block,
    /// Single access burst on the uplink
    Rach,
    /// Synchronization burst on the downlink
    Sch,
}

#[derive(Debug)]
pub struct LchanDesc {
    pub name: &'static str,
    /// RSL channel number without the timeslot bits
    pub chan_nr: u8,
    pub link_id: u8,
    /// Bursts forming one block
    pub bursts: usize,
    /// Size of the burst assembly buffers in bits
    pub burst_buf_size: usize,
    pub flags: u8,
    pub handler: HandlerKind,
}

impl LchanDesc {
    const fn new(name: &'static str, chan_nr: u8, link_id: u8, bursts: usize, flags: u8, handler: HandlerKind) -> Self {
        Self {
            name,
            chan_nr,
            link_id,
            bursts,
            burst_buf_size: bursts * GSM_NBITS_NB_GMSK_PAYLOAD,
            flags,
            handler,
        }
    }

    const fn edge(mut self) -> Self {
        self.burst_buf_size = self.bursts * GSM_NBITS_NB_8PSK_PAYLOAD;
        self
    }
}

use HandlerKind::{Block, None as NoHandler, Rach, Sch};

const AUTO: u8 = LCHAN_FLAG_AUTO;
const CBTX: u8 = LCHAN_FLAG_CBTX;
const PDCH: u8 = LCHAN_FLAG_PDCH;

const DESC_IDLE: LchanDesc = LchanDesc::new("IDLE", 0x00, 0x00, 0, 0, NoHandler);
const DESC_FCCH: LchanDesc = LchanDesc::new("FCCH", 0x00, 0x00, 0, 0, NoHandler);
const DESC_SCH: LchanDesc = LchanDesc::new("SCH", 0x00, 0x00, 1, AUTO, Sch);
const DESC_BCCH: LchanDesc = LchanDesc::new("BCCH", 0x80, 0x00, 4, AUTO, Block);
const DESC_RACH: LchanDesc = LchanDesc::new("RACH", 0x88, 0x00, 1, AUTO, Rach);
const DESC_CCCH: LchanDesc = LchanDesc::new("CCCH", 0x90, 0x00, 4, AUTO, Block);
const DESC_TCHF: LchanDesc = LchanDesc::new("TCH/F", 0x08, 0x00, 4, CBTX, Block);
const DESC_TCHH0: LchanDesc = LchanDesc::new("TCH/H(0)", 0x10, 0x00, 2, CBTX, Block);
const DESC_TCHH1: LchanDesc = LchanDesc::new("TCH/H(1)", 0x18, 0x00, 2, CBTX, Block);
const DESC_SDCCH4: [LchanDesc; 4] = [
    LchanDesc::new("SDCCH/4(0)", 0x20, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/4(1)", 0x28, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/4(2)", 0x30, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/4(3)", 0x38, 0x00, 4, CBTX, Block),
];
const DESC_SDCCH8: [LchanDesc; 8] = [
    LchanDesc::new("SDCCH/8(0)", 0x40, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/8(1)", 0x48, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/8(2)", 0x50, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/8(3)", 0x58, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/8(4)", 0x60, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/8(5)", 0x68, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/8(6)", 0x70, 0x00, 4, CBTX, Block),
    LchanDesc::new("SDCCH/8(7)", 0x78, 0x00, 4, CBTX, Block),
];
const DESC_SACCHTF: LchanDesc = LchanDesc::new("SACCH/TF", 0x08, LINK_ID_SACCH, 4, CBTX, Block);
const DESC_SACCHTH0: LchanDesc = LchanDesc::new("SACCH/TH(0)", 0x10, LINK_ID_SACCH, 4, CBTX, Block);
const DESC_SACCHTH1: LchanDesc = LchanDesc::new("SACCH/TH(1)", 0x18, LINK_ID_SACCH, 4, CBTX, Block);
const DESC_SACCH4: [LchanDesc; 4] = [
    LchanDesc::new("SACCH/4(0)", 0x20, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/4(1)", 0x28, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/4(2)", 0x30, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/4(3)", 0x38, LINK_ID_SACCH, 4, CBTX, Block),
];
const DESC_SACCH8: [LchanDesc; 8] = [
    LchanDesc::new("SACCH/8(0)", 0x40, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/8(1)", 0x48, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/8(2)", 0x50, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/8(3)", 0x58, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/8(4)", 0x60, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/8(5)", 0x68, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/8(6)", 0x70, LINK_ID_SACCH, 4, CBTX, Block),
    LchanDesc::new("SACCH/8(7)", 0x78, LINK_ID_SACCH, 4, CBTX, Block),
];
const DESC_PDTCH: LchanDesc = LchanDesc::new("PDTCH", 0xc0, 0x00, 4, PDCH, Block).edge();
const DESC_PTCCH: LchanDesc = LchanDesc::new("PTCCH", 0xc0, 0x00, 4, PDCH, Block);
const DESC_SDCCH4_CBCH: LchanDesc = LchanDesc::new("SDCCH/4(CBCH)", 0xc8, 0x00, 4, AUTO, Block);
const DESC_SDCCH8_CBCH: LchanDesc = LchanDesc::new("SDCCH/8(CBCH)", 0xd0, 0x00, 4, AUTO, Block);

impl LchanType {
    pub const COUNT: usize = LchanType::Sdcch8Cbch as usize + 1;

    pub const ALL: [LchanType; LchanType::COUNT] = [
        LchanType::Idle,
        LchanType::Fcch,
        LchanType::Sch,
        LchanType::Bcch,
        LchanType::Rach,
        LchanType::Ccch,
        LchanType::TchF,
        LchanType::TchH0,
        LchanType::TchH1,
        LchanType::Sdcch4_0,
        LchanType::Sdcch4_1,
        LchanType::Sdcch4_2,
        LchanType::Sdcch4_3,
        LchanType::Sdcch8_0,
        LchanType::Sdcch8_1,
        LchanType::Sdcch8_2,
        LchanType::Sdcch8_3,
        LchanType::Sdcch8_4,
        LchanType::Sdcch8_5,
        LchanType::Sdcch8_6,
        LchanType::Sdcch8_7,
        LchanType::SacchTf,
        LchanType::SacchTh0,
        LchanType::SacchTh1,
        LchanType::Sacch4_0,
        LchanType::Sacch4_1,
        LchanType::Sacch4_2,
        LchanType::Sacch4_3,
        LchanType::Sacch8_0,
        LchanType::Sacch8_1,
        LchanType::Sacch8_2,
        LchanType::Sacch8_3,
        LchanType::Sacch8_4,
        LchanType::Sacch8_5,
        LchanType::Sacch8_6,
        LchanType::Sacch8_7,
        LchanType::Pdtch,
        LchanType::Ptcch,
        LchanType::Sdcch4Cbch,
        LchanType::Sdcch8Cbch,
    ];

    pub const SDCCH4: [LchanType; 4] =
        [LchanType::Sdcch4_0, LchanType::Sdcch4_1, LchanType::Sdcch4_2, LchanType::Sdcch4_3];
    pub const SACCH4: [LchanType; 4] =
        [LchanType::Sacch4_0, LchanType::Sacch4_1, LchanType::Sacch4_2, LchanType::Sacch4_3];
    pub const SDCCH8: [LchanType; 8] = [
        LchanType::Sdcch8_0,
        LchanType::Sdcch8_1,
        LchanType::Sdcch8_2,
        LchanType::Sdcch8_3,
        LchanType::Sdcch8_4,
        LchanType::Sdcch8_5,
        LchanType::Sdcch8_6,
        LchanType::Sdcch8_7,
    ];
    pub const SACCH8: [LchanType; 8] = [
        LchanType::Sacch8_0,
        LchanType::Sacch8_1,
        LchanType::Sacch8_2,
        LchanType::Sacch8_3,
        LchanType::Sacch8_4,
        LchanType::Sacch8_5,
        LchanType::Sacch8_6,
        LchanType::Sacch8_7,
    ];

    /// Bit of this type in a layout channel mask
    #[inline]
    pub fn mask_bit(self) -> u64 {
        1u64 << (self as u8)
    }

    pub fn desc(self) -> &'static LchanDesc {
        match self {
            LchanType::Idle => &DESC_IDLE,
            LchanType::Fcch => &DESC_FCCH,
            LchanType::Sch => &DESC_SCH,
            LchanType::Bcch => &DESC_BCCH,
            LchanType::Rach => &DESC_RACH,
            LchanType::Ccch => &DESC_CCCH,
            LchanType::TchF => &DESC_TCHF,
            LchanType::TchH0 => &DESC_TCHH0,
            LchanType::TchH1 => &DESC_TCHH1,
            LchanType::Sdcch4_0 => &DESC_SDCCH4[0],
            LchanType::Sdcch4_1 => &DESC_SDCCH4[1],
            LchanType::Sdcch4_2 => &DESC_SDCCH4[2],
            LchanType::Sdcch4_3 => &DESC_SDCCH4[3],
            LchanType::Sdcch8_0 => &DESC_SDCCH8[0],
            LchanType::Sdcch8_1 => &DESC_SDCCH8[1],
            LchanType::Sdcch8_2 => &DESC_SDCCH8[2],
            LchanType::Sdcch8_3 => &DESC_SDCCH8[3],
            LchanType::Sdcch8_4 => &DESC_SDCCH8[4],
            LchanType::Sdcch8_5 => &DESC_SDCCH8[5],
            LchanType::Sdcch8_6 => &DESC_SDCCH8[6],
            LchanType::Sdcch8_7 => &DESC_SDCCH8[7],
            LchanType::SacchTf => &DESC_SACCHTF,
            LchanType::SacchTh0 => &DESC_SACCHTH0,
            LchanType::SacchTh1 => &DESC_SACCHTH1,
            LchanType::Sacch4_0 => &DESC_SACCH4[0],
            LchanType::Sacch4_1 => &DESC_SACCH4[1],
            LchanType::Sacch4_2 => &DESC_SACCH4[2],
            LchanType::Sacch4_3 => &DESC_SACCH4[3],
            LchanType::Sacch8_0 => &DESC_SACCH8[0],
            LchanType::Sacch8_1 => &DESC_SACCH8[1],
            LchanType::Sacch8_2 => &DESC_SACCH8[2],
            LchanType::Sacch8_3 => &DESC_SACCH8[3],
            LchanType::Sacch8_4 => &DESC_SACCH8[4],
            LchanType::Sacch8_5 => &DESC_SACCH8[5],
            LchanType::Sacch8_6 => &DESC_SACCH8[6],
            LchanType::Sacch8_7 => &DESC_SACCH8[7],
            LchanType::Pdtch => &DESC_PDTCH,
            LchanType::Ptcch => &DESC_PTCCH,
            LchanType::Sdcch4Cbch => &DESC_SDCCH4_CBCH,
            LchanType::Sdcch8Cbch => &DESC_SDCCH8_CBCH,
        }
    }

    #[inline]
    pub fn has_flag(self, flag: u8) -> bool {
        self.desc().flags & flag != 0
    }

    pub fn is_auto(self) -> bool {
        self.has_flag(LCHAN_FLAG_AUTO)
    }

    pub fn is_cbtx(self) -> bool {
        self.has_flag(LCHAN_FLAG_CBTX)
    }

    pub fn is_traffic(self) -> bool {
        matches!(self, LchanType::TchF | LchanType::TchH0 | LchanType::TchH1)
    }

    /// Checks whether an RSL channel number and link id address this channel type
    pub fn matches(self, chan_nr: u8, link_id: u8) -> bool {
        let desc = self.desc();
        if desc.handler == HandlerKind::None {
            return false;
        }
        desc.chan_nr == (chan_nr & 0xf8) && desc.link_id == (link_id & 0xc0)
    }
}

impl fmt::Display for LchanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.desc().name)
    }
}
