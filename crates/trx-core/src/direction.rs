use core::fmt;

/// Link direction, seen from the mobile station
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum Direction {
    /// Uplink, MS to network (bursts we transmit)
    Ul,
    /// Downlink, network to MS (bursts we receive)
    Dl,
}

impl Direction {
    #[inline]
    pub fn is_ul(&self) -> bool {
        matches!(self, Direction::Ul)
    }

    #[inline]
    pub fn is_dl(&self) -> bool {
        matches!(self, Direction::Dl)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ul => write!(f, "UL"),
            Direction::Dl => write!(f, "DL"),
        }
    }
}
