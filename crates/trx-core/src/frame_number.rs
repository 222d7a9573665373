use core::fmt;

/// Number of TDMA frames in a hyperframe. Frame numbers wrap back to 0 here.
pub const GSM_HYPERFRAME: u32 = 2048 * 26 * 51;

/// Duration of a single TDMA frame in microseconds (120ms / 26)
pub const GSM_TDMA_FN_DURATION_US: u64 = 4615;

/// Difference between two raw frame numbers, handling wrap-around of the hyperframe.
/// The result is normalized to the range [-GSM_HYPERFRAME/2, GSM_HYPERFRAME/2).
pub fn fn_diff(a: u32, b: u32) -> i32 {
    let hf = GSM_HYPERFRAME as i32;
    let mut diff = (a % GSM_HYPERFRAME) as i32 - (b % GSM_HYPERFRAME) as i32;
    while diff < -hf / 2 { diff += hf; }
    while diff >= hf / 2 { diff -= hf; }
    diff
}

/// TDMA frame number, always kept below GSM_HYPERFRAME
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameNumber(u32);

impl FrameNumber {
    /// Builds a frame number, reducing the raw value modulo the hyperframe
    pub fn new(raw: u32) -> FrameNumber {
        FrameNumber(raw % GSM_HYPERFRAME)
    }

    /// Returns None if the raw value is outside the hyperframe
    pub fn checked(raw: u32) -> Option<FrameNumber> {
        if raw < GSM_HYPERFRAME { Some(FrameNumber(raw)) } else { None }
    }

    #[inline(always)]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Add a (possibly negative) number of frames
    pub fn add(self, frames: i32) -> FrameNumber {
        let hf = GSM_HYPERFRAME as i64;
        FrameNumber((self.0 as i64 + frames as i64).rem_euclid(hf) as u32)
    }

    /// Next frame number
    #[inline(always)]
    pub fn next(self) -> FrameNumber {
        self.add(1)
    }

    /// Signed number of frames from `b` to `self`
    pub fn diff(self, b: FrameNumber) -> i32 {
        fn_diff(self.0, b.0)
    }

    /// Offset of this frame within a repeating multiframe of `period` frames
    #[inline(always)]
    pub fn offset_in(self, period: u32) -> u32 {
        self.0 % period
    }

    /// T1: superframe counter (fn / (26 * 51))
    pub fn t1(self) -> u32 {
        self.0 / (26 * 51)
    }

    /// T2: position in the 26-multiframe
    pub fn t2(self) -> u32 {
        self.0 % 26
    }

    /// T3: position in the 51-multiframe
    pub fn t3(self) -> u32 {
        self.0 % 51
    }
}

impl From<FrameNumber> for u32 {
    fn from(f: FrameNumber) -> u32 {
        f.0
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn={} ({}/{}/{})", self.0, self.t1(), self.t2(), self.t3())
    }
}
