//! Multiframe layouts (3GPP TS 45.002 clause 7, table 3)
//!
//! Every physical channel configuration maps each frame of its repeating
//! period to a downlink and an uplink logical channel plus the burst id
//! within that channel's block. The tables are generated once and live for
//! the whole process.

use std::sync::LazyLock;

use trx_core::{Direction, FrameNumber, PchanConfig};

use crate::LchanType;

/// Burst owner of one frame in one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstRole {
    pub lchan: LchanType,
    /// Position of the burst within its block
    pub bid: u8,
}

impl BurstRole {
    pub const IDLE: BurstRole = BurstRole { lchan: LchanType::Idle, bid: 0 };

    const fn new(lchan: LchanType, bid: u8) -> Self {
        Self { lchan, bid }
    }

    pub fn is_idle(&self) -> bool {
        self.lchan == LchanType::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MframeEntry {
    pub dl: BurstRole,
    pub ul: BurstRole,
}

impl MframeEntry {
    #[inline]
    pub fn role(&self, dir: Direction) -> BurstRole {
        match dir {
            Direction::Dl => self.dl,
            Direction::Ul => self.ul,
        }
    }
}

#[derive(Debug)]
pub struct Layout {
    pub pchan: PchanConfig,
    pub name: &'static str,
    /// Timeslots this layout applies to
    pub slotmask: u8,
    pub period: u32,
    /// Union of the channel types appearing in `frames`, idle excluded
    pub lchan_mask: u64,
    pub frames: Vec<MframeEntry>,
}

impl Layout {
    fn new(pchan: PchanConfig, name: &'static str, slotmask: u8, frames: Vec<MframeEntry>) -> Self {
        let lchan_mask = frames
            .iter()
            .flat_map(|e| [e.dl.lchan, e.ul.lchan])
            .filter(|l| *l != LchanType::Idle)
            .fold(0u64, |mask, l| mask | l.mask_bit());
        Self { pchan, name, slotmask, period: frames.len() as u32, lchan_mask, frames }
    }

    #[inline]
    pub fn entry(&self, frame: FrameNumber) -> &MframeEntry {
        &self.frames[frame.offset_in(self.period) as usize]
    }

    /// Owner of `frame` in direction `dir`
    #[inline]
    pub fn role(&self, frame: FrameNumber, dir: Direction) -> BurstRole {
        self.entry(frame).role(dir)
    }

    pub fn has_lchan(&self, lchan: LchanType) -> bool {
        self.lchan_mask & lchan.mask_bit() != 0
    }

    /// Channel types hosted by this layout, in catalogue order
    pub fn lchans(&self) -> impl Iterator<Item = LchanType> + '_ {
        LchanType::ALL.into_iter().filter(|l| self.has_lchan(*l))
    }
}

/// Finds the layout of a configuration on a timeslot
pub fn lookup(pchan: PchanConfig, tn: u8) -> Option<&'static Layout> {
    if tn >= 8 {
        return None;
    }
    LAYOUTS.iter().find(|l| l.pchan == pchan && l.slotmask & (1 << tn) != 0)
}

static LAYOUTS: LazyLock<Vec<Layout>> = LazyLock::new(|| {
    let mut layouts = vec![
        Layout::new(PchanConfig::None, "NONE", 0xff, vec![MframeEntry { dl: BurstRole::IDLE, ul: BurstRole::IDLE }]),
        build_ccch(),
        build_ccch_sdcch4(false),
        build_ccch_sdcch4(true),
        build_sdcch8(false),
        build_sdcch8(true),
        build_pdch(),
    ];
    for tn in 0..8 {
        layouts.push(build_tchf(tn));
        layouts.push(build_tchh(tn));
    }
    layouts
});

/// CCCH blocks of a 51-multiframe without SDCCH/4
const CCCH_BLOCKS: [u32; 9] = [6, 12, 16, 22, 26, 32, 36, 42, 46];
/// CCCH blocks left when SDCCH/4 is combined in
const CCCH_BLOCKS_COMB: [u32; 3] = [6, 12, 16];
const SDCCH4_BLOCKS: [u32; 4] = [22, 26, 32, 36];
const SACCH4_BLOCKS: [u32; 2] = [42, 46];

/// Dedicated uplink channels lag their downlink by this many frames
const UL_LAG: u32 = 15;

/// Index of the 4-frame block starting in `starts` that contains `f`, and the position within it
fn block_pos(f: u32, starts: &[u32]) -> Option<(usize, u8)> {
    starts
        .iter()
        .position(|&s| f >= s && f < s + 4)
        .map(|idx| (idx, (f - starts[idx]) as u8))
}

/// FCCH, SCH, BCCH and CCCH part of a 51-multiframe
fn bcch_role(f51: u32, ccch_blocks: &[u32]) -> Option<BurstRole> {
    if f51 < 50 && f51 % 10 == 0 {
        return Some(BurstRole::new(LchanType::Fcch, 0));
    }
    if f51 < 50 && f51 % 10 == 1 {
        return Some(BurstRole::new(LchanType::Sch, 0));
    }
    if (2..=5).contains(&f51) {
        return Some(BurstRole::new(LchanType::Bcch, (f51 - 2) as u8));
    }
    block_pos(f51, ccch_blocks).map(|(_, bid)| BurstRole::new(LchanType::Ccch, bid))
}

fn build_ccch() -> Layout {
    let frames = (0..51)
        .map(|f| MframeEntry {
            dl: bcch_role(f, &CCCH_BLOCKS).unwrap_or(BurstRole::IDLE),
            ul: BurstRole::new(LchanType::Rach, 0),
        })
        .collect();
    Layout::new(PchanConfig::Ccch, "CCCH", 0x01, frames)
}

fn sdcch4_dl(f: u32, cbch: bool) -> BurstRole {
    let f51 = f % 51;
    if let Some(role) = bcch_role(f51, &CCCH_BLOCKS_COMB) {
        return role;
    }
    if let Some((sub, bid)) = block_pos(f51, &SDCCH4_BLOCKS) {
        if cbch && sub == 2 {
            return BurstRole::new(LchanType::Sdcch4Cbch, bid);
        }
        return BurstRole::new(LchanType::SDCCH4[sub], bid);
    }
    if let Some((idx, bid)) = block_pos(f51, &SACCH4_BLOCKS) {
        // First 51-multiframe carries SACCH/4 0 and 1, the second 2 and 3
        let sub = idx + if f >= 51 { 2 } else { 0 };
        if cbch && sub == 2 {
            return BurstRole::IDLE;
        }
        return BurstRole::new(LchanType::SACCH4[sub], bid);
    }
    BurstRole::IDLE
}

fn sdcch4_ul(f: u32, cbch: bool) -> BurstRole {
    let dl = sdcch4_dl((f + 102 - UL_LAG) % 102, false);
    if cbch && matches!(dl.lchan, LchanType::Sdcch4_2 | LchanType::Sacch4_2) {
        // CBCH is downlink only
        return BurstRole::IDLE;
    }
    if LchanType::SDCCH4.contains(&dl.lchan) || LchanType::SACCH4.contains(&dl.lchan) {
        return dl;
    }
    BurstRole::new(LchanType::Rach, 0)
}

fn build_ccch_sdcch4(cbch: bool) -> Layout {
    let frames = (0..102)
        .map(|f| MframeEntry { dl: sdcch4_dl(f, cbch), ul: sdcch4_ul(f, cbch) })
        .collect();
    if cbch {
        Layout::new(PchanConfig::CcchSdcch4Cbch, "CCCH+SDCCH4+CBCH", 0x01, frames)
    } else {
        Layout::new(PchanConfig::CcchSdcch4, "CCCH+SDCCH4", 0x01, frames)
    }
}

fn sdcch8_dl(f: u32, cbch: bool) -> BurstRole {
    let f51 = f % 51;
    match f51 {
        0..32 => {
            let sub = (f51 / 4) as usize;
            let bid = (f51 % 4) as u8;
            if cbch && sub == 2 {
                BurstRole::new(LchanType::Sdcch8Cbch, bid)
            } else {
                BurstRole::new(LchanType::SDCCH8[sub], bid)
            }
        }
        32..48 => {
            // First 51-multiframe carries SACCH/8 0..3, the second 4..7
            let sub = ((f51 - 32) / 4) as usize + if f >= 51 { 4 } else { 0 };
            if cbch && sub == 2 {
                BurstRole::IDLE
            } else {
                BurstRole::new(LchanType::SACCH8[sub], ((f51 - 32) % 4) as u8)
            }
        }
        _ => BurstRole::IDLE,
    }
}

fn sdcch8_ul(f: u32, cbch: bool) -> BurstRole {
    let dl = sdcch8_dl((f + 102 - UL_LAG) % 102, false);
    if cbch && matches!(dl.lchan, LchanType::Sdcch8_2 | LchanType::Sacch8_2) {
        return BurstRole::IDLE;
    }
    dl
}

fn build_sdcch8(cbch: bool) -> Layout {
    let frames = (0..102)
        .map(|f| MframeEntry { dl: sdcch8_dl(f, cbch), ul: sdcch8_ul(f, cbch) })
        .collect();
    if cbch {
        Layout::new(PchanConfig::Sdcch8Cbch, "SDCCH8+CBCH", 0xff, frames)
    } else {
        Layout::new(PchanConfig::Sdcch8, "SDCCH8", 0xff, frames)
    }
}

/// SACCH burst order on traffic channels rotates with the timeslot pair
fn tch_sacch_bid(f: u32, tn: u8) -> u8 {
    ((f / 26 + 4 - (tn / 2) as u32) % 4) as u8
}

/// Position of a traffic frame among the 24 traffic frames of a 26-multiframe
fn tch_index(f26: u32) -> u32 {
    if f26 < 12 { f26 } else { f26 - 1 }
}

fn tchf_role(f: u32, tn: u8) -> BurstRole {
    let f26 = f % 26;
    let sacch_pos = if tn % 2 == 0 { 12 } else { 25 };
    if f26 == sacch_pos {
        BurstRole::new(LchanType::SacchTf, tch_sacch_bid(f, tn))
    } else if f26 == 12 || f26 == 25 {
        BurstRole::IDLE
    } else {
        BurstRole::new(LchanType::TchF, (tch_index(f26) % 4) as u8)
    }
}

fn build_tchf(tn: u8) -> Layout {
    let frames = (0..104)
        .map(|f| {
            let role = tchf_role(f, tn);
            MframeEntry { dl: role, ul: role }
        })
        .collect();
    Layout::new(PchanConfig::TchF, "TCH/F", 1 << tn, frames)
}

fn tchh_role(f: u32, tn: u8) -> BurstRole {
    let f26 = f % 26;
    match f26 {
        12 => BurstRole::new(LchanType::SacchTh0, tch_sacch_bid(f, tn)),
        25 => BurstRole::new(LchanType::SacchTh1, tch_sacch_bid(f, tn)),
        _ => {
            let i = tch_index(f26);
            let lchan = if i % 2 == 0 { LchanType::TchH0 } else { LchanType::TchH1 };
            BurstRole::new(lchan, ((i / 2) % 2) as u8)
        }
    }
}

fn build_tchh(tn: u8) -> Layout {
    let frames = (0..104)
        .map(|f| {
            let role = tchh_role(f, tn);
            MframeEntry { dl: role, ul: role }
        })
        .collect();
    Layout::new(PchanConfig::TchH, "TCH/H", 1 << tn, frames)
}

fn pdch_role(f: u32) -> BurstRole {
    let f52 = f % 52;
    match f52 {
        12 | 38 => BurstRole::new(LchanType::Ptcch, (f / 26) as u8),
        25 | 51 => BurstRole::IDLE,
        _ => {
            // Skip the PTCCH and idle frames preceding this one
            let skipped = [12, 25, 38].iter().filter(|&&x| x < f52).count() as u32;
            BurstRole::new(LchanType::Pdtch, ((f52 - skipped) % 4) as u8)
        }
    }
}

fn build_pdch() -> Layout {
    let frames = (0..104)
        .map(|f| {
            let role = pdch_role(f);
            MframeEntry { dl: role, ul: role }
        })
        .collect();
    Layout::new(PchanConfig::Pdch, "PDCH", 0xff, frames)
}
