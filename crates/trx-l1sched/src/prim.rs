use trx_config::FillerPattern;
use trx_core::UBit;

/// Transmit primitive queued by the upper layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPrim {
    /// RSL channel number, timeslot bits included
    pub chan_nr: u8,
    pub link_id: u8,
    /// Coded bits of a whole block, or the coded bits of an access burst
    pub bits: Vec<UBit>,
    /// Signalling stolen from a traffic channel
    pub facch: bool,
    /// Generated by the scheduler to keep a continuous channel busy
    pub filler: bool,
}

impl TxPrim {
    pub fn new(chan_nr: u8, link_id: u8, bits: Vec<UBit>) -> Self {
        Self { chan_nr, link_id, bits, facch: false, filler: false }
    }

    pub fn facch(chan_nr: u8, link_id: u8, bits: Vec<UBit>) -> Self {
        Self { facch: true, ..Self::new(chan_nr, link_id, bits) }
    }

    /// Builds a filler block of `len` bits
    pub fn filler(chan_nr: u8, link_id: u8, len: usize, pattern: FillerPattern) -> Self {
        let bits = match pattern {
            FillerPattern::Zeros => vec![0; len],
            FillerPattern::Random => (0..len).map(|_| rand::random_range(0..2) as UBit).collect(),
        };
        Self { filler: true, ..Self::new(chan_nr, link_id, bits) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filler_patterns() {
        let zeros = TxPrim::filler(0x20, 0x00, 464, FillerPattern::Zeros);
        assert!(zeros.filler && !zeros.facch);
        assert!(zeros.bits.iter().all(|&b| b == 0));

        let random = TxPrim::filler(0x20, 0x40, 464, FillerPattern::Random);
        assert_eq!(random.bits.len(), 464);
        assert!(random.bits.iter().all(|&b| b <= 1));
    }
}
