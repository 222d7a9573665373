//! Burst geometry, training sequences and bit representations (3GPP TS 45.002 clause 5.2)

/// Hard bit, 0 or 1
pub type UBit = u8;

/// Soft bit estimate in -127..=127. Positive values lean towards 1, negative towards 0.
pub type SoftBit = i8;

/// Normal burst length in bits for GMSK modulation
pub const GSM_NBITS_NB_GMSK_BURST: usize = 148;
/// Normal burst length in bits for 8PSK modulation (3 bits per symbol)
pub const GSM_NBITS_NB_8PSK_BURST: usize = 444;
/// Access burst length in bits (without guard period)
pub const GSM_NBITS_AB_GMSK_BURST: usize = 88;

/// Data bits carried by one GMSK normal burst (two halves of 58 bits)
pub const GSM_NBITS_NB_GMSK_PAYLOAD: usize = 116;
/// Data bits carried by one 8PSK normal burst (two halves of 174 bits)
pub const GSM_NBITS_NB_8PSK_PAYLOAD: usize = 348;

/// Symbol layout of a normal burst: tail, data, training, data, tail
const NB_TAIL_SYMS: usize = 3;
const NB_HALF_SYMS: usize = 58;
const NB_TSC_SYMS: usize = 26;

/// The two 57-bit fields subject to A5 ciphering (stealing flags excluded)
pub const CIPHER_FIELD_OFFSETS: [usize; 2] = [3, 88];
pub const CIPHER_FIELD_LEN: usize = 57;

/// Normal burst training sequences, TSC set 1 (Table 5.2.3a)
pub const NB_TRAINING_BITS: [[UBit; 26]; 8] = [
    [0, 0, 1, 0, 0, 1, 0, 1, 1, 1, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1],
    [0, 0, 1, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 1, 1, 0, 1, 1, 1],
    [0, 1, 0, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 1, 1, 0],
    [0, 1, 0, 0, 0, 1, 1, 1, 1, 0, 1, 1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 1, 0],
    [0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 1, 0, 0, 1, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1],
    [0, 1, 0, 0, 1, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 1, 0, 1, 0],
    [1, 0, 1, 0, 0, 1, 1, 1, 1, 1, 0, 1, 1, 0, 0, 0, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1],
    [1, 1, 1, 0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 0, 0],
];

/// Extended tail bits opening an access burst
pub const AB_TAIL_BITS: [UBit; 8] = [0, 0, 1, 1, 1, 0, 1, 0];

/// Access burst synchronization sequence (TS0)
pub const AB_SYNCH_BITS: [UBit; 41] = [
    0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 1,
    1, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 0, 0, 1, 1, 1, 1, 0, 0,
    0,
];

/// Coded bits carried by an access burst
pub const AB_DATA_BITS: usize = 36;

/// Coded bits carried by a synchronization burst (39 + 39)
pub const SB_DATA_BITS: usize = 78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    Gmsk,
    Psk8,
}

impl Modulation {
    /// Guesses the modulation from a normal burst length
    pub fn from_burst_len(len: usize) -> Option<Modulation> {
        match len {
            GSM_NBITS_NB_GMSK_BURST => Some(Modulation::Gmsk),
            GSM_NBITS_NB_8PSK_BURST => Some(Modulation::Psk8),
            _ => None,
        }
    }

    #[inline]
    pub fn bits_per_symbol(self) -> usize {
        match self {
            Modulation::Gmsk => 1,
            Modulation::Psk8 => 3,
        }
    }

    pub fn burst_len(self) -> usize {
        GSM_NBITS_NB_GMSK_BURST * self.bits_per_symbol()
    }

    pub fn payload_len(self) -> usize {
        GSM_NBITS_NB_GMSK_PAYLOAD * self.bits_per_symbol()
    }
}

/// Convert an unsigned soft byte as sent by the transceiver into a soft bit.
/// 0 is a definite one, 255 a definite zero.
#[inline]
pub fn usbit_to_sbit(b: u8) -> SoftBit {
    if b == 255 { -127 } else { (127 - b as i16) as SoftBit }
}

/// Inverse of usbit_to_sbit, maps -127..=127 to 254..=0
#[inline]
pub fn sbit_to_usbit(s: SoftBit) -> u8 {
    (127 - s.max(-127) as i16) as u8
}

#[inline]
pub fn ubit_to_sbit(b: UBit) -> SoftBit {
    if b != 0 { 127 } else { -127 }
}

#[inline]
pub fn sbit_to_ubit(s: SoftBit) -> UBit {
    (s > 0) as UBit
}

/// Compose a GMSK normal burst from 116 data bits and a training sequence code
pub fn build_normal_burst(payload: &[UBit], tsc: u8) -> Vec<UBit> {
    assert_eq!(payload.len(), GSM_NBITS_NB_GMSK_PAYLOAD);

    let mut burst = Vec::with_capacity(GSM_NBITS_NB_GMSK_BURST);
    burst.extend_from_slice(&[0; NB_TAIL_SYMS]);
    burst.extend_from_slice(&payload[..NB_HALF_SYMS]);
    burst.extend_from_slice(&NB_TRAINING_BITS[(tsc & 0x07) as usize]);
    burst.extend_from_slice(&payload[NB_HALF_SYMS..]);
    burst.extend_from_slice(&[0; NB_TAIL_SYMS]);
    burst
}

/// Compose an access burst padded with guard bits to a full burst length
pub fn build_access_burst(data: &[UBit]) -> Vec<UBit> {
    assert_eq!(data.len(), AB_DATA_BITS);

    let mut burst = Vec::with_capacity(GSM_NBITS_NB_GMSK_BURST);
    burst.extend_from_slice(&AB_TAIL_BITS);
    burst.extend_from_slice(&AB_SYNCH_BITS);
    burst.extend_from_slice(data);
    burst.extend_from_slice(&[0; 3]);
    burst.resize(GSM_NBITS_NB_GMSK_BURST, 0);
    burst
}

/// Extract the data bits (both halves, stealing flags included) of a received normal burst.
/// Returns None if the burst length matches no supported modulation.
pub fn nb_payload(burst: &[SoftBit]) -> Option<Vec<SoftBit>> {
    let m = Modulation::from_burst_len(burst.len())?;
    let bps = m.bits_per_symbol();
    let half = NB_HALF_SYMS * bps;
    let first = NB_TAIL_SYMS * bps;
    let second = (NB_TAIL_SYMS + NB_HALF_SYMS + NB_TSC_SYMS) * bps;

    let mut out = Vec::with_capacity(m.payload_len());
    out.extend_from_slice(&burst[first..first + half]);
    out.extend_from_slice(&burst[second..second + half]);
    Some(out)
}

/// Extract the coded bits of a synchronization burst, around its 64-bit extended training sequence
pub fn sb_payload(burst: &[SoftBit]) -> Option<Vec<SoftBit>> {
    if burst.len() != GSM_NBITS_NB_GMSK_BURST {
        return None;
    }
    let mut out = Vec::with_capacity(SB_DATA_BITS);
    out.extend_from_slice(&burst[3..42]);
    out.extend_from_slice(&burst[106..145]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_bit_conversion() {
        assert_eq!(usbit_to_sbit(0), 127);
        assert_eq!(usbit_to_sbit(127), 0);
        assert_eq!(usbit_to_sbit(254), -127);
        assert_eq!(usbit_to_sbit(255), -127);
        for s in -127..=127i8 {
            assert_eq!(usbit_to_sbit(sbit_to_usbit(s)), s);
        }
        assert_eq!(sbit_to_ubit(ubit_to_sbit(1)), 1);
        assert_eq!(sbit_to_ubit(ubit_to_sbit(0)), 0);
    }

    #[test]
    fn test_normal_burst_layout() {
        let payload: Vec<UBit> = (0..116).map(|i| (i % 2) as UBit).collect();
        let burst = build_normal_burst(&payload, 3);
        assert_eq!(burst.len(), GSM_NBITS_NB_GMSK_BURST);
        assert_eq!(&burst[0..3], &[0, 0, 0]);
        assert_eq!(&burst[61..87], &NB_TRAINING_BITS[3]);
        assert_eq!(&burst[145..148], &[0, 0, 0]);

        // Extracting the payload again yields the original data bits
        let soft: Vec<SoftBit> = burst.iter().map(|&b| ubit_to_sbit(b)).collect();
        let extracted: Vec<UBit> = nb_payload(&soft).unwrap().iter().map(|&s| sbit_to_ubit(s)).collect();
        assert_eq!(extracted, payload);
    }

    #[test]
    fn test_access_burst_layout() {
        let data = [1u8; AB_DATA_BITS];
        let burst = build_access_burst(&data);
        assert_eq!(burst.len(), GSM_NBITS_NB_GMSK_BURST);
        assert_eq!(&burst[0..8], &AB_TAIL_BITS);
        assert_eq!(&burst[8..49], &AB_SYNCH_BITS);
        assert_eq!(&burst[49..85], &data);
        assert!(burst[85..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_8psk_payload_len() {
        let burst = vec![0i8; GSM_NBITS_NB_8PSK_BURST];
        assert_eq!(nb_payload(&burst).unwrap().len(), GSM_NBITS_NB_8PSK_PAYLOAD);
        assert!(nb_payload(&burst[..100]).is_none());
    }
}
